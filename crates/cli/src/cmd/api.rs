//! Api command: fetch sample records with a store's data API settings.

use std::path::Path;

use anyhow::{Context, Result, bail};

use storegen_lib::api::{DataApiClient, MAX_COUNT};

use crate::output::{print_json, print_warning};

pub fn cmd_api(config: &Path, store: &str, products: u32, collections: u32) -> Result<()> {
  let batch = super::load_batch(config)?;

  let Some(spec) = batch.stores.iter().find(|s| s.name == store) else {
    bail!("store '{}' is not defined in {}", store, config.display());
  };
  let Some(api) = spec.api.clone().or(batch.options.api) else {
    bail!("no API settings for store '{}'", store);
  };

  if products > MAX_COUNT || collections > MAX_COUNT {
    print_warning(&format!("counts above {} are clamped", MAX_COUNT));
  }

  let client = DataApiClient::new(api);
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let (products, collections) = rt.block_on(async {
    let products = client.get_products(products).await?;
    let collections = client.get_collections(collections).await?;
    anyhow::Ok((products, collections))
  })?;

  print_json(&serde_json::json!({
    "store": store,
    "products": products,
    "collections": collections,
  }))
}
