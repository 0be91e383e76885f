// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use patio_app::Vehicle;

use crate::table::format_cell;

pub const MISSING_VALUE: &str = "Não informado";

const SECTIONS: [(&str, &[(&str, &str)]); 5] = [
    (
        "Ocorrência",
        &[
            ("spj", "SPJ"),
            ("ano", "ANO"),
            ("natureza", "Natureza"),
            ("procedimento", "Procedimento"),
            ("equipe", "Equipe"),
            ("num_procedimento", "Nº Procedimento"),
        ],
    ),
    (
        "Apreensão",
        &[
            ("status", "Status"),
            ("chave", "Chave"),
            ("circunscricao", "Circunscrição"),
            ("patio", "Pátio"),
            ("data_apreensao", "Data da Apreensão"),
            ("ultima_movimentacao", "Última Movimentação"),
        ],
    ),
    (
        "Veículo",
        &[
            ("tipo", "Tipo"),
            ("modelo", "Modelo"),
            ("ano_fabricacao", "Ano de Fabricação"),
            ("ano_modelo", "Ano do Modelo"),
            ("cor", "Cor"),
            ("chassi", "Chassi"),
            ("placa_original", "Placa Original"),
            ("placa_ostentada", "Placa Ostentada"),
            ("proprietario", "Proprietário"),
            ("pessoa_relacionada", "Pessoa Relacionada"),
        ],
    ),
    (
        "Perícia",
        &[
            ("pericia", "Perícia"),
            ("protocolo", "Protocolo"),
            ("status_pericia", "Status da Perícia"),
            ("numero_laudo", "Número do Laudo"),
            ("resultado_laudo", "Resultado do Laudo"),
            ("afis", "AFIS"),
        ],
    ),
    ("Observações", &[("obs1", "OBS1"), ("obs2", "OBS2")]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailField {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSection {
    pub title: &'static str,
    pub fields: Vec<DetailField>,
}

/// Groups every vehicle field into titled sections. Values use the table
/// formatters; blanks read as [`MISSING_VALUE`].
pub fn detail_sections(vehicle: &Vehicle) -> Vec<DetailSection> {
    SECTIONS
        .into_iter()
        .map(|(title, fields)| DetailSection {
            title,
            fields: fields
                .iter()
                .map(|&(key, label)| {
                    let value = format_cell(vehicle, key);
                    DetailField {
                        key,
                        label,
                        value: if value.trim().is_empty() {
                            MISSING_VALUE.to_owned()
                        } else {
                            value
                        },
                    }
                })
                .collect(),
        })
        .collect()
}
