//! Column sets of the known search types.

use crate::column::{Column, ColumnType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    LicenseLookup,
    UnderageCompliance,
    DelinquencyList,
    CureList,
    ManufacturerPostings,
}

impl SearchType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "licenseLookup" => Some(SearchType::LicenseLookup),
            "underageCompliance" => Some(SearchType::UnderageCompliance),
            "deliquencyList" => Some(SearchType::DelinquencyList),
            "cureList" => Some(SearchType::CureList),
            "manufacturerPostings" => Some(SearchType::ManufacturerPostings),
            _ => None,
        }
    }

    pub fn key_field(&self) -> &'static str {
        "key"
    }

    /// Columns of the result table.
    pub fn columns(&self) -> Vec<Column> {
        match self {
            SearchType::LicenseLookup => vec![
                url("ACCT. NAME", "blUrl"),
                Column::new("CORP. NAME", "corpName"),
                Column::new("ADDRESS", "address"),
                Column::new("LIC. NBR", "licNumber"),
                Column::new("LIC. TYPE", "licType"),
                Column::new("CITY", "city"),
                Column::new("COUNTY", "county"),
                Column::new("STATUS", "status"),
                date("EXPIR. DATE", "expDate"),
            ],
            SearchType::UnderageCompliance => vec![
                date("DATE", "date"),
                Column::new("LIC. NBR", "licNumber"),
                Column::new("NAME", "name"),
                Column::new("ADDRESS", "address"),
                Column::new("CITY", "city"),
                Column::new("COUNTY", "county"),
                Column::new("RESULTS", "results"),
            ],
            SearchType::DelinquencyList => vec![
                Column::new("DISTRIBUTOR'S BUSINESS NAME", "distName"),
                Column::new("RETAILER BUSINESS NAME", "name"),
                Column::new("RETAILER BUSINESS ADDRESS", "address"),
                Column::new("RETAILER CITY", "city"),
                Column::new("RETAILER IL LICENSE NBR", "licNumber"),
                date("DELINQUENCY DATE", "date"),
            ],
            SearchType::CureList => vec![
                Column::new("LIC NBR", "licNumber"),
                Column::new("CORP NAME", "name"),
                Column::new("ADDRESS", "address"),
                Column::new("CITY", "city"),
                date("DATE", "date"),
            ],
            SearchType::ManufacturerPostings => vec![
                Column::new("LIC TYPE NAME", "licType"),
                url("BUSINESS NAME", "blaUrl"),
                date("FILING DATE", "date"),
            ],
        }
    }

    /// Columns written by the csv export.
    pub fn export_columns(&self) -> Vec<Column> {
        match self {
            SearchType::LicenseLookup => vec![
                Column::new("Acct. Name", "name"),
                Column::new("Corp. Name", "corpName"),
                Column::new("Corp. Addr", "address"),
                Column::new("Lic. Nbr", "licNumber"),
                Column::new("Lic. Type", "licType"),
                Column::new("County", "county"),
                Column::new("City", "city"),
                Column::new("Status", "status"),
                Column::new("Expir. Date", "expDate"),
            ],
            SearchType::UnderageCompliance => vec![
                Column::new("Date", "date"),
                Column::new("Lic. Number", "licNumber"),
                Column::new("Name", "name"),
                Column::new("Address", "address"),
                Column::new("City", "city"),
                Column::new("County", "county"),
                Column::new("Results", "results"),
            ],
            SearchType::DelinquencyList => vec![
                Column::new("Distributor's business name", "distName"),
                Column::new("Retailer Business Name", "name"),
                Column::new("Retailer Business address", "address"),
                Column::new("Retailer City", "city"),
                Column::new("Retailer IL License nbr", "licNumber"),
                Column::new("Delinquency date", "date"),
            ],
            SearchType::CureList => vec![
                Column::new("LIC NBR", "licNumber"),
                Column::new("CORP NAME", "name"),
                Column::new("ADDRESS", "address"),
                Column::new("CITY", "city"),
                date("DATE", "date"),
            ],
            SearchType::ManufacturerPostings => default_export_columns(),
        }
    }
}

pub fn default_export_columns() -> Vec<Column> {
    vec![Column::new("Name", "name")]
}

/// Export projection for a raw search type discriminator.
pub fn export_columns_for(search_type: Option<&str>) -> Vec<Column> {
    search_type
        .and_then(SearchType::parse)
        .map(|st| st.export_columns())
        .unwrap_or_else(default_export_columns)
}

fn date(label: &str, field: &str) -> Column {
    Column::new(label, field).with_column_type(ColumnType::Date)
}

fn url(label: &str, field: &str) -> Column {
    Column::new(label, field)
        .with_column_type(ColumnType::Url)
        .with_label_field("name")
}
