//! Purchase orders (commandes), their lines and the stock they credit.
//!
//! Both status machines are monotonic: a transition only ever moves forward
//! and terminal states are absorbing.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};
use validator::Validate;

use super::DomainError;
use crate::models::{command_item, commande, product_type, stock_entry};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
    IntoStaticStr,
)]
pub enum CommandeStatus {
    EnAttenteAssignation,
    EnAttenteValidationFournisseur,
    ValideeFournisseur,
}

impl CommandeStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// The state a commande must be in to move to `self`. `None` for the
    /// initial state, which is only ever reached by creation.
    pub fn previous(&self) -> Option<CommandeStatus> {
        match self {
            CommandeStatus::EnAttenteAssignation => None,
            CommandeStatus::EnAttenteValidationFournisseur => {
                Some(CommandeStatus::EnAttenteAssignation)
            }
            CommandeStatus::ValideeFournisseur => {
                Some(CommandeStatus::EnAttenteValidationFournisseur)
            }
        }
    }

    pub fn can_transition_to(&self, target: CommandeStatus) -> bool {
        target.previous() == Some(*self)
    }

    pub fn parse_stored(id: i32, raw: &str) -> Result<Self, DomainError> {
        raw.parse().map_err(|_| {
            DomainError::Integrity(format!("Commande {} has unknown status '{}'", id, raw))
        })
    }
}

impl std::fmt::Display for CommandeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
    IntoStaticStr,
)]
pub enum LineStatus {
    Soumis,
    #[strum(serialize = "ValidéFournisseur")]
    #[serde(rename = "ValidéFournisseur")]
    ValideFournisseur,
    #[strum(serialize = "Annulé")]
    #[serde(rename = "Annulé")]
    Annule,
}

impl LineStatus {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn can_transition_to(&self, target: LineStatus) -> bool {
        matches!(
            (self, target),
            (LineStatus::Soumis, LineStatus::ValideFournisseur)
                | (LineStatus::Soumis, LineStatus::Annule)
        )
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LineStatus::Soumis)
    }

    /// Parses a supplier decision on a line. Only the two terminal states
    /// may be requested.
    pub fn parse_decision(raw: &str) -> Result<Self, DomainError> {
        match raw.parse::<LineStatus>() {
            Ok(status) if status.is_terminal() => Ok(status),
            _ => Err(DomainError::Validation {
                message: format!(
                    "Invalid status '{}'. Allowed: {}, {}",
                    raw,
                    LineStatus::ValideFournisseur,
                    LineStatus::Annule
                ),
                details: vec![super::FieldError {
                    field: "statutLigne".to_string(),
                    message: "must be ValidéFournisseur or Annulé".to_string(),
                }],
            }),
        }
    }

    pub fn parse_stored(id: i32, raw: &str) -> Result<Self, DomainError> {
        raw.parse().map_err(|_| {
            DomainError::Integrity(format!("CommandItem {} has unknown status '{}'", id, raw))
        })
    }
}

impl std::fmt::Display for LineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purchase order header
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commande {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub statut_cmd: CommandeStatus,
    pub date_cmd: String,
    pub montant_total: f64,
    pub fournisseur_id: Option<i32>,
    pub projet_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<commande::Model> for Commande {
    type Error = DomainError;

    fn try_from(model: commande::Model) -> Result<Self, Self::Error> {
        Ok(Commande {
            statut_cmd: CommandeStatus::parse_stored(model.id, &model.statut_cmd)?,
            id: model.id,
            name: model.name,
            kind: model.r#type,
            date_cmd: model.date_cmd,
            montant_total: model.montant_total,
            fournisseur_id: model.fournisseur_id,
            projet_id: model.projet_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Rejects stored headers whose required fields are unusable. Nothing is
/// back-filled: a header that fails here was written by something other
/// than the lifecycle engine.
pub fn check_integrity(model: &commande::Model) -> Result<(), DomainError> {
    if model.name.trim().is_empty() {
        return Err(DomainError::Integrity(format!(
            "Commande {} has no name",
            model.id
        )));
    }
    if !model.montant_total.is_finite() || model.montant_total < 0.0 {
        return Err(DomainError::Integrity(format!(
            "Commande {} has invalid montantTotal {}",
            model.id, model.montant_total
        )));
    }
    Ok(())
}

/// Product type fields shown alongside an order line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductTypeSummary {
    pub id: i32,
    pub name: String,
    pub unit: String,
    pub category: Option<String>,
}

impl From<product_type::Model> for ProductTypeSummary {
    fn from(model: product_type::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            unit: model.unit,
            category: model.category,
        }
    }
}

/// Order line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandItem {
    pub id: i32,
    pub commande_id: i32,
    pub product_type_id: i32,
    pub quantite_commandee: i32,
    pub prix_unitaire: Option<f64>,
    pub statut_ligne: LineStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<ProductTypeSummary>,
    pub created_at: String,
    pub updated_at: String,
}

impl CommandItem {
    pub fn from_model(
        model: command_item::Model,
        product_type: Option<ProductTypeSummary>,
    ) -> Result<Self, DomainError> {
        Ok(CommandItem {
            statut_ligne: LineStatus::parse_stored(model.id, &model.statut_ligne)?,
            id: model.id,
            commande_id: model.commande_id,
            product_type_id: model.product_type_id,
            quantite_commandee: model.quantite_commandee,
            prix_unitaire: model.prix_unitaire,
            product_type,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl TryFrom<command_item::Model> for CommandItem {
    type Error = DomainError;

    fn try_from(model: command_item::Model) -> Result<Self, Self::Error> {
        CommandItem::from_model(model, None)
    }
}

/// Header with its lines attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandeWithItems {
    #[serde(flatten)]
    pub commande: Commande,
    pub items: Vec<CommandItem>,
}

/// Stock ledger row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub id: i32,
    pub product_type_id: i32,
    pub command_item_id: i32,
    pub quantite_disponible: f64,
    pub date_entree_stock: String,
}

impl From<stock_entry::Model> for StockEntry {
    fn from(model: stock_entry::Model) -> Self {
        Self {
            id: model.id,
            product_type_id: model.product_type_id,
            command_item_id: model.command_item_id,
            quantite_disponible: model.quantite_disponible,
            date_entree_stock: model.date_entree_stock,
        }
    }
}

/// One requested line of a new commande
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCommandItem {
    pub product_type_id: i32,
    #[validate(range(min = 1, message = "quantiteCommandee must be at least 1"))]
    pub quantite_commandee: i32,
    #[validate(range(min = 0.0, message = "prixUnitaire cannot be negative"))]
    pub prix_unitaire: Option<f64>,
}

/// Body of `POST /commandes`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommandeInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date_cmd: Option<DateTime<Utc>>,
    #[validate(range(min = 0.0, message = "montantTotal cannot be negative"))]
    pub montant_total: f64,
    #[serde(alias = "projectId")]
    pub projet_id: i32,
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<NewCommandItem>,
}

impl CreateCommandeInput {
    /// Field-level checks, then the one-line-per-product rule. Runs before
    /// any storage access.
    pub fn check(&self) -> Result<(), DomainError> {
        self.validate()?;

        if self.name.trim().is_empty() {
            return Err(DomainError::Validation {
                message: "Invalid input".to_string(),
                details: vec![super::FieldError {
                    field: "name".to_string(),
                    message: "name is required".to_string(),
                }],
            });
        }
        if !self.montant_total.is_finite() {
            return Err(DomainError::Validation {
                message: "Invalid input".to_string(),
                details: vec![super::FieldError {
                    field: "montantTotal".to_string(),
                    message: "montantTotal must be a number".to_string(),
                }],
            });
        }

        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.product_type_id) {
                return Err(DomainError::Conflict(format!(
                    "ProductType {} appears more than once in this commande",
                    item.product_type_id
                )));
            }
        }

        Ok(())
    }

    pub fn product_type_ids(&self) -> Vec<i32> {
        self.items.iter().map(|i| i.product_type_id).collect()
    }
}
