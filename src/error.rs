use thiserror::Error;

use crate::types::ColumnRole;

#[derive(Error, Debug)]
pub enum AutomatorError {
    #[error("Impossible de détecter les colonnes 'date' et 'montant'. Vérifie ton fichier. (colonne manquante : {role})")]
    MissingRequiredColumn { role: ColumnRole },

    #[error("Aucune ligne exploitable : {total_rows} lignes lues, aucune avec une date et un montant valides")]
    NoValidRows { total_rows: usize },

    #[error("Montants trop élevés : la somme des {what} dépasse la capacité de calcul")]
    RevenueOverflow { what: &'static str },

    #[error("Le fichier est vide")]
    EmptyFile,

    #[error("Erreur CSV : {0}")]
    Csv(#[from] csv::Error),

    #[error("Erreur de lecture/écriture : {0}")]
    Io(#[from] std::io::Error),

    #[error("Erreur de sérialisation : {0}")]
    Json(#[from] serde_json::Error),

    #[error("Erreur PDF : {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, AutomatorError>;
