//! Seller workflow: import a CSV, adjust prices, publish to the backend.

use std::path::Path;

use crate::csv_import::{self, ParsedCsv};
use crate::error::{Result, RivalsError};
use crate::models::{InventoryItem, RawRow};
use crate::normalize::normalize_all;
use crate::remote::{InventoryApi, ReplaceResponse, UpsertResponse};
use crate::services::inventory::InventoryStore;
use crate::transform::PriceTransform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// Server inventory becomes exactly the imported items.
    Replace,
    /// Imported items are upserted into the server inventory.
    BulkUpsert,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishReceipt {
    Replaced(ReplaceResponse),
    Upserted(UpsertResponse),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Items with at least one price field.
    pub with_price: usize,
    pub quantity_total: u64,
}

/// A parsed CSV import awaiting publication.
pub struct CsvImport {
    rows: Vec<RawRow>,
    items: Vec<InventoryItem>,
    warnings: Vec<String>,
    transform: PriceTransform,
    dry_run: bool,
}

impl CsvImport {
    /// Parse, normalize and price-transform raw CSV text. Dry run starts on.
    pub fn from_text(text: &str, transform: PriceTransform) -> Self {
        Self::from_parsed(csv_import::parse_csv(text), transform)
    }

    /// Same as [`from_text`](Self::from_text) for a file on disk.
    pub fn from_path(path: &Path, transform: PriceTransform) -> Result<Self> {
        Ok(Self::from_parsed(csv_import::read_csv_file(path)?, transform))
    }

    fn from_parsed(parsed: ParsedCsv, transform: PriceTransform) -> Self {
        let items = transform.apply(&normalize_all(&parsed.rows));
        Self {
            rows: parsed.rows,
            items,
            warnings: parsed.warnings,
            transform,
            dry_run: true,
        }
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn transform(&self) -> PriceTransform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: PriceTransform) {
        self.transform = transform;
    }

    /// Apply the current transform to the current items again. Compounds.
    pub fn reapply(&mut self) {
        self.items = self.transform.apply(&self.items);
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    pub fn stats(&self) -> ImportStats {
        ImportStats {
            with_price: self.items.iter().filter(|i| i.has_price()).count(),
            quantity_total: self.items.iter().map(|i| u64::from(i.quantity)).sum(),
        }
    }

    pub fn filter(&self, text: &str) -> Vec<&InventoryItem> {
        self.items.iter().filter(|i| i.matches(text)).collect()
    }

    /// Upload the items, then mirror them into the local inventory and pull
    /// a fresh copy from the server.
    ///
    /// Refuses to run for non-sellers, with no items, or in dry-run mode. A
    /// failed post-upload refresh is logged; the local mirror stands.
    pub fn publish(
        &self,
        mode: PublishMode,
        api: &dyn InventoryApi,
        inventory: &mut InventoryStore,
        is_seller: bool,
    ) -> Result<PublishReceipt> {
        if !is_seller {
            return Err(RivalsError::NotAuthorized(
                "publishing inventory requires a seller account".into(),
            ));
        }
        if self.items.is_empty() {
            return Err(RivalsError::InvalidArgument("nothing to upload".into()));
        }
        if self.dry_run {
            return Err(RivalsError::InvalidArgument(
                "dry run is enabled; disable it to publish".into(),
            ));
        }

        let receipt = match mode {
            PublishMode::Replace => {
                let resp = api.replace(&self.items)?;
                inventory.replace_items(&self.items);
                PublishReceipt::Replaced(resp)
            }
            PublishMode::BulkUpsert => {
                if !inventory.is_hydrated() {
                    return Err(RivalsError::NotHydrated("inventory"));
                }
                let resp = api.bulk_upsert(&self.items)?;
                inventory.merge_items(&self.items)?;
                PublishReceipt::Upserted(resp)
            }
        };
        tracing::info!(?mode, count = self.items.len(), "inventory published");

        if let Err(e) = inventory.refresh(api) {
            tracing::warn!(error = %e, "refresh after publish failed");
        }
        Ok(receipt)
    }
}
