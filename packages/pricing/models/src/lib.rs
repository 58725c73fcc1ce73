#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Scoring criteria and municipality record types for the pricing map.
//!
//! A municipality record is one row of the precomputed pricing dataset:
//! identity, the scores produced by the upstream scoring model, the CAR
//! property aggregates, the two currency totals, and the columns derived
//! once at load time. Records are immutable for the lifetime of the
//! process; the dashboard only ever reads them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// A scoring or pricing column the dashboard can filter and color by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Criterion {
    /// Mean of the perimeter-based and area-based municipality totals.
    ValorMedio,
    /// Municipality total priced by CAR property perimeter.
    ValorMunPerim,
    /// Municipality total priced by georeferenceable area.
    ValorMunArea,
    /// Aggregate mean score used to compose the final value.
    #[default]
    NotaMedia,
    /// Vegetation score.
    NotaVeg,
    /// Mean CAR lot area score.
    NotaArea,
    /// Relief score.
    NotaRelevo,
    /// Insalubrity score (dengue cases).
    NotaInsalub,
    /// Adjusted insalubrity score (dengue plus venomous animal incidents).
    #[serde(rename = "nota_insalub_2")]
    #[strum(serialize = "nota_insalub_2")]
    NotaInsalub2,
    /// Summed score for the first quarter.
    #[serde(rename = "nota_total_q1")]
    #[strum(serialize = "nota_total_q1")]
    NotaTotalQ1,
    /// Summed score for the second quarter.
    #[serde(rename = "nota_total_q2")]
    #[strum(serialize = "nota_total_q2")]
    NotaTotalQ2,
    /// Summed score for the third quarter.
    #[serde(rename = "nota_total_q3")]
    #[strum(serialize = "nota_total_q3")]
    NotaTotalQ3,
    /// Summed score for the fourth quarter.
    #[serde(rename = "nota_total_q4")]
    #[strum(serialize = "nota_total_q4")]
    NotaTotalQ4,
}

impl Criterion {
    /// Returns every criterion in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ValorMedio,
            Self::ValorMunPerim,
            Self::ValorMunArea,
            Self::NotaMedia,
            Self::NotaVeg,
            Self::NotaArea,
            Self::NotaRelevo,
            Self::NotaInsalub,
            Self::NotaInsalub2,
            Self::NotaTotalQ1,
            Self::NotaTotalQ2,
            Self::NotaTotalQ3,
            Self::NotaTotalQ4,
        ]
    }

    /// Column key of this criterion in the source dataset.
    #[must_use]
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// Whether values of this criterion are monetary amounts.
    ///
    /// Any column whose key mentions `valor` is rendered as currency.
    #[must_use]
    pub fn is_currency(self) -> bool {
        self.key().contains("valor")
    }

    /// Human-readable (pt-BR) label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ValorMedio => "Valor Médio",
            Self::ValorMunPerim => "Valor por Perímetro",
            Self::ValorMunArea => "Valor por Área",
            Self::NotaMedia => "Nota Média",
            Self::NotaVeg => "Vegetação",
            Self::NotaArea => "Área Média dos Lotes CAR",
            Self::NotaRelevo => "Relevo",
            Self::NotaInsalub => "Insalubridade (Dengue)",
            Self::NotaInsalub2 => "Insalubridade Ajustada",
            Self::NotaTotalQ1 => "Precipitação - Trimestre 1",
            Self::NotaTotalQ2 => "Precipitação - Trimestre 2",
            Self::NotaTotalQ3 => "Precipitação - Trimestre 3",
            Self::NotaTotalQ4 => "Precipitação - Trimestre 4",
        }
    }

    /// Short methodology note shown next to the map.
    #[must_use]
    pub const fn explanation(self) -> &'static str {
        match self {
            Self::ValorMedio => {
                "Média entre o valor total por perímetro e o valor total por área do município."
            }
            Self::ValorMunPerim => {
                "Valor total do município em relação ao perímetro total de imóveis CAR, \
                 conforme o Quadro II da Tabela de Rendimento e Preço da minuta de \
                 instrução normativa SEI/INCRA."
            }
            Self::ValorMunArea => {
                "Valor total do município em relação à área georreferenciável."
            }
            Self::NotaMedia => "Média das notas utilizada para composição do valor final.",
            Self::NotaVeg => {
                "Nota relativa à vegetação do local, conforme a classe predominante no \
                 município (aberta, intermediária ou fechada) e a ocorrência média de classe."
            }
            Self::NotaArea => {
                "Nota relativa à área média dos lotes CAR no município: acima de 35 ha, \
                 entre 15 e 35 ha ou até 15 ha, conforme máximas e mínimas."
            }
            Self::NotaRelevo => "Nota relativa ao relevo predominante no município.",
            Self::NotaInsalub => {
                "Nota relativa à insalubridade (casos de dengue por município), distribuída \
                 conforme máximos e mínimos gerais."
            }
            Self::NotaInsalub2 => {
                "Nota de insalubridade ajustada, incluindo a incidência de acidentes com \
                 animais peçonhentos."
            }
            Self::NotaTotalQ1 | Self::NotaTotalQ2 | Self::NotaTotalQ3 | Self::NotaTotalQ4 => {
                "Nota total somada para o trimestre."
            }
        }
    }
}

/// Scores produced by the upstream scoring model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    /// `nota_veg`
    pub veg: f64,
    /// `nota_area`
    pub area: f64,
    /// `nota_relevo`
    pub relevo: f64,
    /// `nota_insalub`
    pub insalub: f64,
    /// `nota_insalub_2`, floored to 1 at load time.
    pub insalub_2: f64,
    /// `nota_total_q1` .. `nota_total_q4`
    pub total_quarters: [f64; 4],
    /// `nota_media`
    pub media: f64,
}

/// CAR property aggregates and currency totals for a municipality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    /// Georeferenceable area (`area_georef`).
    pub area_georef: f64,
    /// Number of CAR-registered properties (`num_imoveis`).
    pub num_imoveis: f64,
    /// Total CAR property area (`area_car_total`).
    pub area_car_total: f64,
    /// Summed CAR property perimeter (`perimetro_total_car`).
    pub perimetro_total_car: f64,
    /// Municipality total priced by perimeter (`valor_mun_perim`).
    pub valor_mun_perim: f64,
    /// Municipality total priced by area (`valor_mun_area`).
    pub valor_mun_area: f64,
}

/// Columns computed once when the dataset is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    /// `valor_medio`: mean of the two currency totals.
    pub valor_medio: f64,
    /// `valor_medio_car`: area-based average value per property.
    pub valor_medio_car: f64,
    /// `val_med_car_perim`: perimeter-based average value per property.
    pub val_med_car_perim: f64,
}

/// One municipality row of the pricing dataset, without geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityRecord {
    /// IBGE municipality code (`CD_MUN`).
    pub code: String,
    /// Municipality name.
    pub name: String,
    /// State abbreviation (`SIGLA_UF`).
    pub state: String,
    pub scores: Scores,
    pub holdings: Holdings,
    pub derived: Derived,
    /// Source columns not consumed by the dashboard, kept for the table.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MunicipalityRecord {
    /// Raw value of `criterion` for this record.
    #[must_use]
    pub const fn value(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::ValorMedio => self.derived.valor_medio,
            Criterion::ValorMunPerim => self.holdings.valor_mun_perim,
            Criterion::ValorMunArea => self.holdings.valor_mun_area,
            Criterion::NotaMedia => self.scores.media,
            Criterion::NotaVeg => self.scores.veg,
            Criterion::NotaArea => self.scores.area,
            Criterion::NotaRelevo => self.scores.relevo,
            Criterion::NotaInsalub => self.scores.insalub,
            Criterion::NotaInsalub2 => self.scores.insalub_2,
            Criterion::NotaTotalQ1 => self.scores.total_quarters[0],
            Criterion::NotaTotalQ2 => self.scores.total_quarters[1],
            Criterion::NotaTotalQ3 => self.scores.total_quarters[2],
            Criterion::NotaTotalQ4 => self.scores.total_quarters[3],
        }
    }
}

/// Inclusive numeric interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Creates a range, swapping the bounds if they are reversed.
    #[must_use]
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    /// Whether `value` lies within the range, both ends inclusive.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Width of the range.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Overlap of this range with `outer`. Disjoint ranges yield an empty
    /// range (`min > max`) that contains nothing.
    #[must_use]
    pub fn intersect(self, outer: Self) -> Self {
        Self {
            min: self.min.max(outer.min),
            max: self.max.min(outer.max),
        }
    }

    /// Whether no value can lie within the range.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

/// Snapshot of the sidebar widgets for one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Selected state abbreviations.
    pub states: BTreeSet<String>,
    /// Criterion driving the range filter, colors and statistics.
    pub criterion: Criterion,
    /// Accepted interval for the criterion's value.
    pub range: ValueRange,
}

impl FilterState {
    /// Whether `record` passes every filter.
    #[must_use]
    pub fn accepts(&self, record: &MunicipalityRecord) -> bool {
        self.states.contains(&record.state) && self.range.contains(record.value(self.criterion))
    }
}

/// Min, mean and max of a column over a set of rows.
///
/// All three are `None` when there are no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub count: usize,
    pub min: Option<f64>,
    pub mean: Option<f64>,
    pub max: Option<f64>,
}

/// One histogram bar covering `[start, end)` (the last bar is closed).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram of a column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Number of values counted across all bins.
    #[must_use]
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Height of the tallest bar.
    #[must_use]
    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

/// Five-number summary of one group, with whiskers at 1.5 IQR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxPlot {
    /// Group label (a state abbreviation).
    pub group: String,
    pub count: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest value within `q1 - 1.5 * IQR`.
    pub lower_whisker: f64,
    /// Largest value within `q3 + 1.5 * IQR`.
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Statistics for the selected criterion over the filtered rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionSummary {
    pub criterion: Criterion,
    pub summary: Summary,
    pub histogram: Histogram,
}

/// Criterion-independent statistics over the filtered rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSummary {
    pub municipality_count: usize,
    /// Measured polygon area in hectares.
    pub total_area_ha: f64,
    pub mean_nota_media: Option<f64>,
    pub mean_valor_mun_perim: Option<f64>,
    pub mean_valor_mun_area: Option<f64>,
    pub sum_valor_mun_perim: f64,
    pub sum_valor_mun_area: f64,
    pub nota_media_histogram: Histogram,
    /// `valor_medio` distribution per state, ordered by state.
    pub valor_medio_by_state: Vec<BoxPlot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, media: f64) -> MunicipalityRecord {
        MunicipalityRecord {
            code: "2700000".to_string(),
            name: "Teste".to_string(),
            state: state.to_string(),
            scores: Scores {
                media,
                ..Scores::default()
            },
            holdings: Holdings::default(),
            derived: Derived::default(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn thirteen_criteria_with_unique_keys() {
        let keys: BTreeSet<&str> = Criterion::all().iter().map(|c| c.key()).collect();
        assert_eq!(Criterion::all().len(), 13);
        assert_eq!(keys.len(), 13);
    }

    #[test]
    fn criterion_keys_match_source_columns() {
        assert_eq!(Criterion::NotaInsalub2.key(), "nota_insalub_2");
        assert_eq!(Criterion::NotaTotalQ3.key(), "nota_total_q3");
        assert_eq!(Criterion::ValorMunPerim.key(), "valor_mun_perim");
        for criterion in Criterion::all() {
            let parsed: Criterion = criterion.key().parse().unwrap();
            assert_eq!(parsed, *criterion, "{criterion:?} does not parse back");
        }
    }

    #[test]
    fn serde_uses_column_keys() {
        let json = serde_json::to_string(&Criterion::NotaInsalub2).unwrap();
        assert_eq!(json, "\"nota_insalub_2\"");
        let back: Criterion = serde_json::from_str("\"nota_total_q1\"").unwrap();
        assert_eq!(back, Criterion::NotaTotalQ1);
    }

    #[test]
    fn currency_criteria_are_the_valor_columns() {
        let currency: Vec<Criterion> = Criterion::all()
            .iter()
            .copied()
            .filter(|c| c.is_currency())
            .collect();
        assert_eq!(
            currency,
            vec![
                Criterion::ValorMedio,
                Criterion::ValorMunPerim,
                Criterion::ValorMunArea
            ]
        );
    }

    #[test]
    fn default_criterion_is_mean_score() {
        assert_eq!(Criterion::default(), Criterion::NotaMedia);
    }

    #[test]
    fn range_is_inclusive_and_ordered() {
        let range = ValueRange::new(9.0, 4.0);
        assert_eq!(range.min, 4.0);
        assert_eq!(range.max, 9.0);
        assert!(range.contains(4.0));
        assert!(range.contains(9.0));
        assert!(!range.contains(9.000_001));
    }

    #[test]
    fn intersection_keeps_range_inside_bounds() {
        let outer = ValueRange::new(0.0, 10.0);
        assert_eq!(ValueRange::new(-5.0, 50.0).intersect(outer), outer);
        assert_eq!(
            ValueRange::new(4.0, 50.0).intersect(outer),
            ValueRange::new(4.0, 10.0)
        );
    }

    #[test]
    fn disjoint_intersection_contains_nothing() {
        let range = ValueRange::new(12.0, 20.0).intersect(ValueRange::new(0.0, 10.0));
        assert!(range.is_empty());
        assert!(!range.contains(10.0));
        assert!(!range.contains(12.0));
    }

    #[test]
    fn filter_requires_state_and_range() {
        let filter = FilterState {
            states: BTreeSet::from(["AL".to_string()]),
            criterion: Criterion::NotaMedia,
            range: ValueRange::new(4.0, 9.0),
        };
        assert!(filter.accepts(&record("AL", 5.0)));
        assert!(!filter.accepts(&record("SE", 5.0)));
        assert!(!filter.accepts(&record("AL", 2.0)));
    }
}
