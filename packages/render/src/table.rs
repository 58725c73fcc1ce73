//! Tabular view of the filtered rows, without geometry or row ids.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use pricing_map_dataset::FilteredView;
use pricing_map_models::{Criterion, MunicipalityRecord};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::format::{escape_html, reais, rounded};

/// Fixed leading columns, in display order. Extra source columns follow,
/// sorted by name.
const FIXED_COLUMNS: &[&str] = &[
    "CD_MUN",
    "mun_nome",
    "SIGLA_UF",
    "nota_veg",
    "nota_area",
    "nota_relevo",
    "nota_insalub",
    "nota_insalub_2",
    "nota_total_q1",
    "nota_total_q2",
    "nota_total_q3",
    "nota_total_q4",
    "nota_media",
    "area_georef",
    "num_imoveis",
    "area_car_total",
    "perimetro_total_car",
    "valor_mun_perim",
    "valor_mun_area",
    "valor_medio",
    "valor_medio_car",
    "val_med_car_perim",
];

/// Source column that identifies rows internally and is never shown.
const HIDDEN_COLUMN: &str = "fid";

/// Derived per-property perimeter value; currency despite lacking `valor`.
const PERIMETER_VALUE_COLUMN: &str = "val_med_car_perim";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    /// One JSON object per row, keyed by column.
    pub rows: Vec<Map<String, Value>>,
}

impl Table {
    /// Builds the table for every row in `view`, in file order.
    #[must_use]
    pub fn build(view: &FilteredView<'_>) -> Self {
        let extras: BTreeSet<&str> = view
            .rows()
            .iter()
            .flat_map(|m| m.record.extra.keys().map(String::as_str))
            .filter(|key| *key != HIDDEN_COLUMN && !FIXED_COLUMNS.contains(key))
            .collect();

        let columns: Vec<String> = FIXED_COLUMNS
            .iter()
            .copied()
            .chain(extras)
            .map(ToString::to_string)
            .collect();

        let rows = view
            .rows()
            .iter()
            .map(|m| row(&m.record, &columns))
            .collect();

        Self { columns, rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Plain HTML `<table>`; currency columns use `R$` formatting and
    /// missing cells are blank.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"table-wrapper\"><table class=\"data-table\">\n<thead><tr>");
        for column in &self.columns {
            let _ = write!(html, "<th>{}</th>", escape_html(column));
        }
        html.push_str("</tr></thead>\n<tbody>\n");

        if self.rows.is_empty() {
            let _ = writeln!(
                html,
                "<tr><td class=\"empty\" colspan=\"{}\">Nenhum município corresponde aos filtros selecionados.</td></tr>",
                self.columns.len()
            );
        }
        for row in &self.rows {
            html.push_str("<tr>");
            for column in &self.columns {
                let text = row
                    .get(column)
                    .map(|v| cell_text(column, v))
                    .unwrap_or_default();
                let _ = write!(html, "<td>{}</td>", escape_html(&text));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody></table></div>");
        html
    }
}

fn row(record: &MunicipalityRecord, columns: &[String]) -> Map<String, Value> {
    columns
        .iter()
        .filter_map(|column| cell(record, column).map(|value| (column.clone(), value)))
        .collect()
}

fn cell(record: &MunicipalityRecord, column: &str) -> Option<Value> {
    let number = |v: f64| Some(serde_json::json!(v));
    match column {
        "CD_MUN" => Some(Value::String(record.code.clone())),
        "mun_nome" => Some(Value::String(record.name.clone())),
        "SIGLA_UF" => Some(Value::String(record.state.clone())),
        "area_georef" => number(record.holdings.area_georef),
        "num_imoveis" => Some(count(record.holdings.num_imoveis)),
        "area_car_total" => number(record.holdings.area_car_total),
        "perimetro_total_car" => number(record.holdings.perimetro_total_car),
        "valor_medio_car" => number(record.derived.valor_medio_car),
        "val_med_car_perim" => number(record.derived.val_med_car_perim),
        key => key.parse::<Criterion>().map_or_else(
            |_| record.extra.get(key).cloned(),
            |criterion| number(record.value(criterion)),
        ),
    }
}

/// Whole counts serialize as JSON integers.
fn count(value: f64) -> Value {
    #[allow(clippy::cast_possible_truncation)]
    let whole = value as i64;
    #[allow(clippy::cast_precision_loss)]
    let exact = whole as f64 == value;
    if exact {
        Value::from(whole)
    } else {
        serde_json::json!(value)
    }
}

fn is_currency_column(column: &str) -> bool {
    column.contains("valor") || column == PERIMETER_VALUE_COLUMN
}

fn cell_text(column: &str, value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(v) if is_currency_column(column) => reais(v),
            _ if n.is_i64() || n.is_u64() => n.to_string(),
            Some(v) => rounded(v),
            None => n.to_string(),
        },
        other => other.to_string(),
    }
}
