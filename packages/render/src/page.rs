//! Full dashboard page: header, filter sidebar and the selected tab.
//!
//! Every render is a pure function of the dataset and one [`FilterState`]
//! snapshot. The sidebar is a plain GET form; a few lines of inline script
//! submit it whenever a widget changes.

use std::fmt::Write as _;

use pricing_map_dataset::{Dataset, FilteredView, stats};
use pricing_map_models::{Criterion, FilterState, ValueRange};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::charts::{box_plot_svg, histogram_svg};
use crate::format::{
    NOT_AVAILABLE, criterion_value, decimal, escape_html, optional_criterion_value, reais, rounded,
};
use crate::intro::intro_html;
use crate::map::{Legend, MapScene};
use crate::table::Table;

/// Logo served from the assets directory.
pub const LOGO_PATH: &str = "/assets/img_1.png";

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const FULLSCREEN_CSS: &str =
    "https://unpkg.com/leaflet.fullscreen@3.0.2/Control.FullScreen.css";
const FULLSCREEN_JS: &str = "https://unpkg.com/leaflet.fullscreen@3.0.2/Control.FullScreen.js";

/// Dashboard tabs, in display order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tab {
    #[default]
    Intro,
    Map,
    Stats,
    Table,
}

impl Tab {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Intro, Self::Map, Self::Stats, Self::Table]
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Intro => "📌 Introdução",
            Self::Map => "🌍 Mapa",
            Self::Stats => "📊 Estatística Geral",
            Self::Table => "📄 Tabela",
        }
    }
}

/// Renders the whole page for `filter`, showing `tab`.
#[must_use]
pub fn render_page(dataset: &Dataset, filter: &FilterState, tab: Tab) -> String {
    let view = dataset.filter(filter);
    log::debug!(
        "Rendering {tab} tab: {} of {} municipalities",
        view.len(),
        dataset.municipalities().len()
    );

    let content = match tab {
        Tab::Intro => intro_html(),
        Tab::Map => map_tab(&view),
        Tab::Stats => stats_tab(&view),
        Tab::Table => table_tab(&view),
    };
    let leaflet = if tab == Tab::Map {
        format!(
            "<link rel=\"stylesheet\" href=\"{LEAFLET_CSS}\">\n\
             <link rel=\"stylesheet\" href=\"{FULLSCREEN_CSS}\">\n\
             <script src=\"{LEAFLET_JS}\"></script>\n\
             <script src=\"{FULLSCREEN_JS}\"></script>\n"
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Precificação de Áreas - MDA</title>
{leaflet}<style>{STYLE}</style>
</head>
<body>
<header class="page-header">
  <img src="{LOGO_PATH}" alt="Logo" class="logo">
  <div class="titles">
    <h1>Dashboard - Precificação de Áreas</h1>
    <h3>Análise de notas e valores por município</h3>
  </div>
</header>
<div class="layout">
{sidebar}
<main>
{nav}
{content}
</main>
</div>
<script>{FORM_SCRIPT}</script>
</body>
</html>"#,
        sidebar = sidebar(dataset, filter, tab, view.len()),
        nav = tab_nav(tab),
    )
}

fn tab_nav(active: Tab) -> String {
    let mut nav = String::from("<nav class=\"tabs\">");
    for tab in Tab::all() {
        let _ = write!(
            nav,
            "<button type=\"button\" class=\"tab{}\" data-tab=\"{tab}\">{}</button>",
            if *tab == active { " active" } else { "" },
            tab.label()
        );
    }
    nav.push_str("</nav>");
    nav
}

fn sidebar(dataset: &Dataset, filter: &FilterState, tab: Tab, row_count: usize) -> String {
    let mut html = String::from(
        "<aside class=\"sidebar\">\n<form id=\"filters\" method=\"get\" action=\"/dashboard\">\n",
    );
    let _ = writeln!(html, "<input type=\"hidden\" name=\"tab\" value=\"{tab}\">");

    let selected: Vec<&str> = filter.states.iter().map(String::as_str).collect();
    let _ = writeln!(
        html,
        "<input type=\"hidden\" name=\"ufs\" value=\"{}\">\n<fieldset><legend>Seleção de Estado (UF)</legend>",
        escape_html(&selected.join(","))
    );
    for state in dataset.states() {
        let _ = writeln!(
            html,
            "<label><input type=\"checkbox\" class=\"uf\" value=\"{value}\"{checked}> {value}</label>",
            value = escape_html(state),
            checked = if filter.states.contains(state) { " checked" } else { "" },
        );
    }
    html.push_str("</fieldset>\n");

    html.push_str(
        "<label for=\"criterion\">Selecione o critério para visualização</label>\n\
         <select id=\"criterion\" name=\"criterion\">\n",
    );
    for criterion in Criterion::all() {
        let _ = writeln!(
            html,
            "<option value=\"{key}\"{selected}>{label}</option>",
            key = criterion.key(),
            selected = if *criterion == filter.criterion { " selected" } else { "" },
            label = escape_html(criterion.label()),
        );
    }
    html.push_str("</select>\n");
    let _ = writeln!(
        html,
        "<p><b>Critério selecionado:</b> {}</p>",
        escape_html(filter.criterion.label())
    );

    if let Some(bounds) = dataset.bounds(filter.criterion) {
        html.push_str(&range_inputs(filter.criterion, bounds, filter.range));
    }

    let _ = writeln!(
        html,
        "<p class=\"count\">{row_count} município(s) selecionado(s)</p>\n</form>\n</aside>"
    );
    html
}

/// Min/max number inputs bounded by the criterion's global range.
fn range_inputs(criterion: Criterion, bounds: ValueRange, selected: ValueRange) -> String {
    let step = if bounds.span() > 0.0 {
        (bounds.span() / 100.0).to_string()
    } else {
        "any".to_string()
    };
    format!(
        "<fieldset class=\"range\"><legend>{label}</legend>\n\
         <label>Mín. <input type=\"number\" name=\"min\" min=\"{lo}\" max=\"{hi}\" step=\"{step}\" value=\"{min}\"></label>\n\
         <label>Máx. <input type=\"number\" name=\"max\" min=\"{lo}\" max=\"{hi}\" step=\"{step}\" value=\"{max}\"></label>\n\
         <div class=\"range-labels\"><span>{lo_label}</span><span>{hi_label}</span></div>\n\
         </fieldset>\n",
        label = escape_html(criterion.label()),
        lo = bounds.min,
        hi = bounds.max,
        min = selected.min,
        max = selected.max,
        lo_label = escape_html(&criterion_value(criterion, bounds.min)),
        hi_label = escape_html(&criterion_value(criterion, bounds.max)),
    )
}

fn metric(label: &str, value: &str) -> String {
    format!(
        "<div class=\"metric\"><div class=\"metric-label\">{}</div><div class=\"metric-value\">{}</div></div>",
        escape_html(label),
        escape_html(value)
    )
}

fn map_tab(view: &FilteredView<'_>) -> String {
    let criterion = view.criterion();
    let scene = MapScene::build(view);
    let summary = stats::criterion_summary(view);
    let legend = scene
        .legend
        .as_ref()
        .map(Legend::to_html)
        .unwrap_or_default();
    // `</` inside tooltips must not close the script element.
    let scene_json = serde_json::to_string(&scene)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/");

    let histogram = histogram_svg(
        &summary.histogram,
        &format!("Distribuição de {}", criterion.label()),
        criterion.key(),
        |v| criterion_value(criterion, v),
    );

    format!(
        r#"<section class="map-tab">
<div class="map-column">
  <h2>🌍 Mapa de Precificação</h2>
  <p><b>Critério selecionado:</b> <u>{label}</u></p>
  <p>{explanation}</p>
  <div class="map-container"><div id="map"></div>{legend}</div>
</div>
<div class="stats-column">
  <h2>Stats: {label}</h2>
  {min}{mean}{max}
  <p>Distribuição dos valores por município:</p>
  {histogram}
</div>
<script>const scene = {scene_json};
{MAP_SCRIPT}</script>
</section>"#,
        label = escape_html(criterion.label()),
        explanation = escape_html(criterion.explanation()),
        min = metric("Mínimo", &optional_criterion_value(criterion, summary.summary.min)),
        mean = metric("Médio", &optional_criterion_value(criterion, summary.summary.mean)),
        max = metric("Máximo", &optional_criterion_value(criterion, summary.summary.max)),
    )
}

fn stats_tab(view: &FilteredView<'_>) -> String {
    let general = stats::general_summary(view);
    let optional_reais = |v: Option<f64>| v.map_or_else(|| NOT_AVAILABLE.to_string(), reais);

    let histogram = histogram_svg(
        &general.nota_media_histogram,
        "Distribuição da Nota Média",
        Criterion::NotaMedia.key(),
        rounded,
    );
    let box_plot = box_plot_svg(
        &general.valor_medio_by_state,
        "Distribuição de Valor Médio por UF",
        "SIGLA_UF",
        reais,
    );

    format!(
        r#"<section class="stats-tab">
<h2>📊 Estatística Geral</h2>
<div class="metrics">{area}{nota}{perim}{valor_area}</div>
<p><b>Valor Total Perímetro:</b> {sum_perim}</p>
<p><b>Valor Total Área:</b> {sum_area}</p>
{histogram}
{box_plot}
</section>"#,
        area = metric(
            "Área Total",
            &format!("{} ha", decimal(general.total_area_ha, 2))
        ),
        nota = metric(
            "Nota Média",
            &general
                .mean_nota_media
                .map_or_else(|| NOT_AVAILABLE.to_string(), |v| decimal(v, 2))
        ),
        perim = metric(
            "Valor Médio por Perímetro",
            &optional_reais(general.mean_valor_mun_perim)
        ),
        valor_area = metric(
            "Valor Médio por Área",
            &optional_reais(general.mean_valor_mun_area)
        ),
        sum_perim = escape_html(&reais(general.sum_valor_mun_perim)),
        sum_area = escape_html(&reais(general.sum_valor_mun_area)),
    )
}

fn table_tab(view: &FilteredView<'_>) -> String {
    format!(
        "<section class=\"table-tab\">\n<h2>📄 Tabela de Municípios</h2>\n{}\n</section>",
        Table::build(view).to_html()
    )
}

const STYLE: &str = r"
body { margin: 0; font-family: system-ui, sans-serif; color: #1f2937; }
.page-header { display: flex; align-items: center; gap: 2rem; padding: 1rem 2rem; }
.page-header .logo { width: 320px; max-width: 30vw; }
.page-header h1 { color: #006199; margin: 0; }
.page-header h3 { color: #006199; font-weight: normal; margin: 5px 0 0; }
.layout { display: flex; min-height: calc(100vh - 120px); }
.sidebar { width: 280px; flex: none; background: #e5e5e5; padding: 1rem; }
.sidebar fieldset { border: none; padding: 0; margin: 0 0 1rem; }
.sidebar label { display: block; margin: 0.25rem 0; }
.sidebar select, .sidebar input[type=number] { width: 100%; }
.range-labels { display: flex; justify-content: space-between; font-size: 0.8rem; }
main { flex: 1; padding: 0 1.5rem 2rem; min-width: 0; }
.tabs { display: flex; gap: 0.5rem; border-bottom: 1px solid #d1d5db; margin-bottom: 1rem; }
.tab { border: none; background: none; padding: 0.75rem 1rem; cursor: pointer; font-size: 1rem; }
.tab.active { border-bottom: 3px solid #006199; color: #006199; font-weight: 600; }
.map-tab { display: flex; gap: 1.5rem; }
.map-column { flex: 5; min-width: 0; }
.stats-column { flex: 1.5; min-width: 260px; }
.map-container { position: relative; }
#map { height: 75vh; }
.map-legend { position: absolute; bottom: 30px; left: 30px; width: 180px; background: white; border: 2px solid grey; z-index: 1000; font-size: 10px; padding: 10px; }
.map-legend-swatch { display: block; height: 15px; width: 100%; margin-bottom: 5px; }
.map-legend-labels { display: flex; justify-content: space-between; }
.metrics { display: flex; gap: 1rem; flex-wrap: wrap; }
.metric { padding: 0.5rem 0; min-width: 180px; }
.metric-label { font-size: 0.85rem; color: #4b5563; }
.metric-value { font-size: 1.6rem; }
.table-wrapper { overflow: auto; max-height: 80vh; }
.data-table { border-collapse: collapse; font-size: 0.8rem; }
.data-table th, .data-table td { border: 1px solid #e5e7eb; padding: 4px 8px; white-space: nowrap; }
.data-table th { position: sticky; top: 0; background: #f3f4f6; }
.intro p, .intro dd { text-align: justify; }
.chart { width: 100%; height: auto; }
";

const FORM_SCRIPT: &str = r"
(function () {
  const form = document.getElementById('filters');
  if (!form) return;
  const ufs = form.querySelector('input[name=ufs]');
  const tab = form.querySelector('input[name=tab]');
  form.querySelectorAll('input.uf').forEach(function (box) {
    box.addEventListener('change', function () {
      ufs.value = Array.from(form.querySelectorAll('input.uf:checked')).map(function (b) { return b.value; }).join(',');
      form.submit();
    });
  });
  const criterion = form.querySelector('select[name=criterion]');
  criterion.addEventListener('change', function () {
    form.querySelectorAll('input[name=min], input[name=max]').forEach(function (i) { i.disabled = true; });
    form.submit();
  });
  form.querySelectorAll('input[name=min], input[name=max]').forEach(function (input) {
    input.addEventListener('change', function () { form.submit(); });
  });
  document.querySelectorAll('button[data-tab]').forEach(function (button) {
    button.addEventListener('click', function () {
      tab.value = button.dataset.tab;
      form.submit();
    });
  });
})();
";

const MAP_SCRIPT: &str = r"
(function () {
  const map = L.map('map', { fullscreenControl: true }).setView(scene.center, scene.zoom);
  const streets = L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
    attribution: '&copy; OpenStreetMap contributors'
  }).addTo(map);
  const satellite = L.tileLayer('https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}', {
    attribution: 'Esri'
  });
  L.control.layers({ 'OpenStreetMap': streets, 'Esri Satélite': satellite }).addTo(map);
  L.geoJSON(scene.features, {
    style: function (feature) { return feature.properties.style; },
    onEachFeature: function (feature, layer) { layer.bindTooltip(feature.properties.tooltip, { sticky: true }); }
  }).addTo(map);
})();
";
