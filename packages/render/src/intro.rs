//! Static introduction tab: methodology, sources, data dictionary and the
//! reference document link. No data dependency.

use std::fmt::Write as _;

use crate::format::escape_html;

/// Reference normative document offered for download.
pub const REFERENCE_DOCUMENT_URL: &str =
    "https://raw.githubusercontent.com/victor-arantes/mda-app/main/dados/prec_invra.pdf";

const REFERENCE_DOCUMENT_TITLE: &str =
    "Minuta de Instrução Normativa de Referência SEI/INCRA – 20411255";

const METHODOLOGY: &[&str] = &[
    "A partir do trabalho de elaboração e estabilização metodológica para o cálculo de \
     estimativa de áreas a georreferenciar nos municípios do acordo judicial do desastre de \
     Mariana, faz-se necessário estimar também o valor de todo o volume do serviço a ser \
     realizado.",
    "Para chegar ao valor estimado foi utilizada a minuta de instrução normativa de \
     referência SEI/INCRA – 20411255, que estabelece critérios e parâmetros de cálculo de \
     preços referenciais para a execução de serviços geodésicos e cartográficos de medição \
     e demarcação de imóveis rurais sob jurisdição do INCRA.",
    "Os resultados apresentados correspondem à entrega piloto para o estado de Alagoas, \
     contemplando os critérios de Vegetação, Relevo, Insalubridade, Clima, Área e Acesso.",
];

/// (criterion, description, source)
const SOURCES: &[(&str, &str, &str)] = &[
    (
        "Vegetação",
        "Nota por município calculada com base na vegetação predominante e na vegetação média.",
        "MapBiomas – Coleção 2 (beta), cobertura e uso da terra, 10 m",
    ),
    (
        "Insalubridade",
        "Ocorrências de dengue registradas entre 2024 e 2025, distribuídas entre máximos e \
         mínimos observados. A variante ajustada inclui acidentes com animais peçonhentos.",
        "DataSUS – Transferência de Arquivos",
    ),
    (
        "Relevo",
        "Inclinação do terreno calculada a partir do MDE SRTM e classificada segundo Lepsch \
         (1983), considerando a classe predominante e a média das classes.",
        "USGS SRTM 30 m – Google Earth Engine",
    ),
    (
        "Clima",
        "Krigagem ordinária sobre séries históricas de estações meteorológicas dos últimos 25 \
         anos, com notas atribuídas por trimestre.",
        "INMET – BigQuery (Base dos Dados)",
    ),
    (
        "Área",
        "Média das áreas dos imóveis do CAR total ou parcialmente contidos no município.",
        "Base de dados Zetta",
    ),
    (
        "Acesso",
        "Nota única (1) para todos os municípios, todos acessíveis por rodovia.",
        "—",
    ),
];

/// (column, description)
const DATA_DICTIONARY: &[(&str, &str)] = &[
    ("CD_MUN", "Código do município (IBGE)."),
    ("NM_MUN", "Nome do município (IBGE)."),
    ("SIGLA_UF", "Sigla da unidade federativa (IBGE)."),
    ("ckey", "Chave composta pelo nome e pela unidade federativa do município."),
    ("populacao", "População residente estimada pelo IBGE."),
    ("nota_veg", "Nota relativa à vegetação predominante no município."),
    ("nota_area", "Nota relativa à área média dos lotes CAR no município."),
    ("nota_relevo", "Nota relativa ao relevo predominante no município."),
    ("nota_insalub", "Nota relativa à insalubridade (casos de dengue)."),
    ("nota_insalub_2", "Insalubridade ajustada, incluindo acidentes com animais peçonhentos."),
    ("nota_total_qx", "Nota total somada para o trimestre x (q1 a q4)."),
    ("nota_media", "Média das notas utilizada para composição do valor final."),
    ("area_cidade", "Área total do município."),
    (
        "area_georef",
        "Área georreferenciável, excluindo terras indígenas, terras da União, unidades de \
         conservação e SIGEF.",
    ),
    ("num_imoveis", "Número de imóveis do CAR presentes no município."),
    ("area_car_total", "Área total de imóveis CAR no município."),
    ("perimetro_total_car", "Perímetro somado de todos os imóveis CAR no município."),
    ("valor_mun_perim", "Valor total do município em relação ao perímetro dos imóveis CAR."),
    ("valor_mun_area", "Valor total do município em relação à área georreferenciável."),
    ("valor_medio", "Média entre valor_mun_perim e valor_mun_area."),
    ("valor_medio_car", "Valor médio por imóvel CAR, proporcional à área."),
    ("val_med_car_perim", "Valor médio por imóvel CAR, pelo perímetro."),
];

/// Body of the introduction tab.
#[must_use]
pub fn intro_html() -> String {
    let mut html = String::from("<section class=\"intro\">\n<h2>Introdução</h2>\n");
    for paragraph in METHODOLOGY {
        let _ = writeln!(html, "<p>{}</p>", escape_html(paragraph));
    }

    html.push_str("<h3>Critérios e Fontes</h3>\n<dl>\n");
    for (name, description, source) in SOURCES {
        let _ = writeln!(
            html,
            "<dt>{}</dt><dd>{} <em>Fonte: {}</em></dd>",
            escape_html(name),
            escape_html(description),
            escape_html(source)
        );
    }
    html.push_str("</dl>\n<h3>Dicionário de dados</h3>\n<dl class=\"dictionary\">\n");
    for (column, description) in DATA_DICTIONARY {
        let _ = writeln!(
            html,
            "<dt><code>{}</code></dt><dd>{}</dd>",
            escape_html(column),
            escape_html(description)
        );
    }

    let _ = write!(
        html,
        "</dl>\n<h3>Downloads</h3>\n<p><a href=\"{REFERENCE_DOCUMENT_URL}\" target=\"_blank\" rel=\"noopener\">{}</a></p>\n</section>",
        escape_html(REFERENCE_DOCUMENT_TITLE)
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_the_reference_document() {
        let html = intro_html();
        assert!(html.contains(&format!("href=\"{REFERENCE_DOCUMENT_URL}\"")));
        assert_eq!(html.matches("<a ").count(), 1);
    }

    #[test]
    fn documents_every_consumed_column() {
        let html = intro_html();
        for column in ["CD_MUN", "SIGLA_UF", "nota_media", "valor_mun_perim", "valor_medio"] {
            assert!(
                html.contains(&format!("<code>{column}</code>")),
                "{column} missing from the data dictionary"
            );
        }
    }
}
