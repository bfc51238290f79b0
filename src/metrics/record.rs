//! Entities and per-year output records

use crate::metrics::number::Metric;
use serde::Serialize;
use std::fmt;
use url::Url;

/// Level of the site's geographic hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    Continent,
    Region,
    Country,
}

impl Category {
    /// All categories, in crawl order
    pub const ALL: [Category; 3] = [Category::Continent, Category::Region, Category::Country];

    /// Display name, as written to the output files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continent => "Continent",
            Self::Region => "Region",
            Self::Country => "Country",
        }
    }

    /// Id of the `<ul>` holding this category's links on the listing page
    pub fn list_id(&self) -> &'static str {
        match self {
            Self::Continent => "continent-list",
            Self::Region => "region-list",
            Self::Country => "country-list",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A continent, region or country discovered on the listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub category: Category,
    pub name: String,
    /// Absolute address of the entity's detail page
    pub url: Url,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.category, self.name)
    }
}

/// Named metric slots a year page can fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    Population,
    GeneratedKt,
    PutOnMarketKt,
    FormallyCollectedKt,
    CollectionRate,
    GeneratedPerCapita,
    PutOnMarketPerCapita,
    ImportedKt,
    ExportedKt,
}

impl MetricField {
    /// All fields, in output column order
    pub const ALL: [MetricField; 9] = [
        MetricField::Population,
        MetricField::GeneratedKt,
        MetricField::PutOnMarketKt,
        MetricField::FormallyCollectedKt,
        MetricField::CollectionRate,
        MetricField::GeneratedPerCapita,
        MetricField::PutOnMarketPerCapita,
        MetricField::ImportedKt,
        MetricField::ExportedKt,
    ];

    /// Output column header
    pub fn column(&self) -> &'static str {
        match self {
            Self::Population => "Population",
            Self::GeneratedKt => "E-waste Generated (kt)",
            Self::PutOnMarketKt => "EEE Put on Market (kt)",
            Self::FormallyCollectedKt => "E-waste Formally Collected (kt)",
            Self::CollectionRate => "E-waste Collection Rate (%)",
            Self::GeneratedPerCapita => "E-waste Generated (kg/capita)",
            Self::PutOnMarketPerCapita => "EEE Put on Market (kg/capita)",
            Self::ImportedKt => "E-waste Imported (kt)",
            Self::ExportedKt => "E-waste Exported (kt)",
        }
    }
}

/// Metrics extracted from one year page
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricSet {
    pub population: Option<Metric>,
    pub generated_kt: Option<Metric>,
    pub put_on_market_kt: Option<Metric>,
    pub formally_collected_kt: Option<Metric>,
    pub collection_rate: Option<Metric>,
    pub generated_per_capita: Option<Metric>,
    pub put_on_market_per_capita: Option<Metric>,
    pub imported_kt: Option<Metric>,
    pub exported_kt: Option<Metric>,
}

impl MetricSet {
    /// Current value of one field
    pub fn get(&self, field: MetricField) -> Option<Metric> {
        match field {
            MetricField::Population => self.population,
            MetricField::GeneratedKt => self.generated_kt,
            MetricField::PutOnMarketKt => self.put_on_market_kt,
            MetricField::FormallyCollectedKt => self.formally_collected_kt,
            MetricField::CollectionRate => self.collection_rate,
            MetricField::GeneratedPerCapita => self.generated_per_capita,
            MetricField::PutOnMarketPerCapita => self.put_on_market_per_capita,
            MetricField::ImportedKt => self.imported_kt,
            MetricField::ExportedKt => self.exported_kt,
        }
    }

    /// Overwrites one field, `None` clearing it
    pub fn set(&mut self, field: MetricField, value: Option<Metric>) {
        let slot = match field {
            MetricField::Population => &mut self.population,
            MetricField::GeneratedKt => &mut self.generated_kt,
            MetricField::PutOnMarketKt => &mut self.put_on_market_kt,
            MetricField::FormallyCollectedKt => &mut self.formally_collected_kt,
            MetricField::CollectionRate => &mut self.collection_rate,
            MetricField::GeneratedPerCapita => &mut self.generated_per_capita,
            MetricField::PutOnMarketPerCapita => &mut self.put_on_market_per_capita,
            MetricField::ImportedKt => &mut self.imported_kt,
            MetricField::ExportedKt => &mut self.exported_kt,
        };
        *slot = value;
    }

    /// Returns true if the page yielded anything worth a record
    ///
    /// A record needs either a known population (a stated "n/a" counts) or at
    /// least one concrete figure among the other metrics. An "n/a" on a
    /// non-population metric alone is not enough.
    pub fn has_data(&self) -> bool {
        if self.population.is_some() {
            return true;
        }

        MetricField::ALL
            .iter()
            .filter(|field| **field != MetricField::Population)
            .any(|field| self.get(*field).is_some_and(|m| m.is_value()))
    }
}

/// One output row: every known metric for one entity in one year
///
/// Field order is the column order of the CSV and JSON exports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRecord {
    #[serde(rename = "Category")]
    pub category: Category,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Year")]
    pub year: String,

    #[serde(rename = "Population")]
    pub population: Option<Metric>,

    #[serde(rename = "E-waste Generated (kt)")]
    pub generated_kt: Option<Metric>,

    #[serde(rename = "EEE Put on Market (kt)")]
    pub put_on_market_kt: Option<Metric>,

    #[serde(rename = "E-waste Formally Collected (kt)")]
    pub formally_collected_kt: Option<Metric>,

    #[serde(rename = "E-waste Collection Rate (%)")]
    pub collection_rate: Option<Metric>,

    #[serde(rename = "E-waste Generated (kg/capita)")]
    pub generated_per_capita: Option<Metric>,

    #[serde(rename = "EEE Put on Market (kg/capita)")]
    pub put_on_market_per_capita: Option<Metric>,

    #[serde(rename = "E-waste Imported (kt)")]
    pub imported_kt: Option<Metric>,

    #[serde(rename = "E-waste Exported (kt)")]
    pub exported_kt: Option<Metric>,

    #[serde(rename = "Source URL")]
    pub source_url: String,
}

impl YearRecord {
    /// Builds a record for `entity` in `year`, or `None` if the page held no data
    pub fn from_metrics(
        entity: &Entity,
        year: &str,
        source_url: &Url,
        metrics: MetricSet,
    ) -> Option<Self> {
        if !metrics.has_data() {
            return None;
        }

        Some(Self {
            category: entity.category,
            name: entity.name.clone(),
            year: year.to_string(),
            population: metrics.population,
            generated_kt: metrics.generated_kt,
            put_on_market_kt: metrics.put_on_market_kt,
            formally_collected_kt: metrics.formally_collected_kt,
            collection_rate: metrics.collection_rate,
            generated_per_capita: metrics.generated_per_capita,
            put_on_market_per_capita: metrics.put_on_market_per_capita,
            imported_kt: metrics.imported_kt,
            exported_kt: metrics.exported_kt,
            source_url: source_url.to_string(),
        })
    }

    /// The record's metrics as a set
    pub fn metrics(&self) -> MetricSet {
        MetricSet {
            population: self.population,
            generated_kt: self.generated_kt,
            put_on_market_kt: self.put_on_market_kt,
            formally_collected_kt: self.formally_collected_kt,
            collection_rate: self.collection_rate,
            generated_per_capita: self.generated_per_capita,
            put_on_market_per_capita: self.put_on_market_per_capita,
            imported_kt: self.imported_kt,
            exported_kt: self.exported_kt,
        }
    }
}
