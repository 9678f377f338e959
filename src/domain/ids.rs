//! Domain identifier types with validation
//!
//! Newtype wrappers keep document ids, sheet names and document types from
//! being mixed up at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a grid or flowed document in the remote store
///
/// # Examples
///
/// ```
/// use sheetfill::domain::ids::DocumentId;
/// use std::str::FromStr;
///
/// let id = DocumentId::from_str("1AbCdEf-duplicate").unwrap();
/// assert_eq!(id.as_str(), "1AbCdEf-duplicate");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a new DocumentId, rejecting blank input
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Document ID cannot be empty".to_string());
        }
        if trimmed.contains('/') {
            return Err(format!("Document ID cannot contain '/': {trimmed}"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Title of a sheet (tab) inside a grid document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetName(String);

impl SheetName {
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Sheet name cannot be empty".to_string());
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix usable in A1 notation, e.g. `'Hoja 1'!`
    ///
    /// Single quotes inside the name are doubled.
    pub fn a1_prefix(&self) -> String {
        format!("'{}'!", self.0.replace('\'', "''"))
    }
}

impl fmt::Display for SheetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SheetName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Known document types, each backed by a template resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Travel expense report (legalización de viáticos)
    TravelExpenses,
    /// Purchase order request
    PurchaseOrder,
}

impl DocumentType {
    pub const ALL: [DocumentType; 2] = [DocumentType::TravelExpenses, DocumentType::PurchaseOrder];

    /// Default resource id of the template asset describing this type
    pub fn resource_id(self) -> &'static str {
        match self {
            DocumentType::TravelExpenses => "travel_expenses",
            DocumentType::PurchaseOrder => "purchase_order",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_id())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "travel_expenses" | "viaticos" => Ok(DocumentType::TravelExpenses),
            "purchase_order" | "compras" => Ok(DocumentType::PurchaseOrder),
            other => Err(format!(
                "Unknown document type '{other}'. Expected one of: travel_expenses, purchase_order"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_rejects_blank() {
        assert!(DocumentId::new("   ").is_err());
        assert!(DocumentId::new("a/b").is_err());
        assert_eq!(DocumentId::new(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_sheet_name_prefix_quotes() {
        let sheet = SheetName::new("Gastos d'Ana").unwrap();
        assert_eq!(sheet.a1_prefix(), "'Gastos d''Ana'!");
    }

    #[test]
    fn test_document_type_parsing() {
        assert_eq!(
            DocumentType::from_str("travel-expenses").unwrap(),
            DocumentType::TravelExpenses
        );
        assert_eq!(
            DocumentType::from_str("PURCHASE_ORDER").unwrap(),
            DocumentType::PurchaseOrder
        );
        assert!(DocumentType::from_str("invoice").is_err());
    }

    #[test]
    fn test_document_type_round_trips_through_resource_id() {
        for doc_type in DocumentType::ALL {
            assert_eq!(DocumentType::from_str(doc_type.resource_id()).unwrap(), doc_type);
        }
    }
}
