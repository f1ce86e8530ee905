//! Seed the product catalog from a YAML file.
//!
//! Without `--file`, the catalog shipped with the CLI (`seed/products.yaml`)
//! is used. Entries use the same field names as the admin product API.
//!
//! # Usage
//!
//! ```bash
//! # Replace the catalog with the shipped products
//! tw-cli seed
//!
//! # Append products from another file, with random badges
//! tw-cli seed --file my-products.yaml --keep-existing --randomize-flags
//! ```

use rand::Rng;
use serde::Deserialize;
use tracing::info;

use tidewear_server::db::{PgProductRepository, ProductRepository};
use tidewear_server::models::{NewProduct, ProductInput};

use super::{CommandError, connect};

/// The catalog shipped with the CLI.
const DEFAULT_CATALOG: &str = include_str!("../../seed/products.yaml");

#[derive(Debug, Deserialize)]
struct SeedFile {
    products: Vec<ProductInput>,
}

/// Seed options from the command line.
#[derive(Debug, Clone, Default)]
pub struct SeedOptions {
    /// YAML file to load instead of the shipped catalog.
    pub file: Option<String>,
    /// Keep existing products instead of clearing the catalog first.
    pub keep_existing: bool,
    /// Randomize the new/sale/best-seller badges.
    pub randomize_flags: bool,
}

/// Load products from a YAML file and insert them.
///
/// The whole file is validated before the database is touched.
pub async fn products(options: SeedOptions) -> Result<(), CommandError> {
    let content = match &options.file {
        Some(path) => {
            info!(path = %path, "Loading products from file");
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CommandError::ReadFile {
                    path: path.clone(),
                    source,
                })?
        }
        None => DEFAULT_CATALOG.to_owned(),
    };

    let mut catalog = parse_catalog(&content)?;
    info!(products = catalog.len(), "Parsed catalog");

    if options.randomize_flags {
        randomize_flags(&mut catalog, &mut rand::rng());
    }

    let pool = connect().await?;
    let repository = PgProductRepository::new(pool);

    if !options.keep_existing {
        let removed = repository.delete_all().await?;
        info!(removed, "Old products deleted");
    }

    for product in catalog {
        repository.create(product).await?;
    }

    info!("Seeding complete!");
    Ok(())
}

/// Parse and validate a YAML product list.
fn parse_catalog(content: &str) -> Result<Vec<NewProduct>, CommandError> {
    let file: SeedFile = serde_yaml::from_str(content)?;

    file.products
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            input
                .into_new_product()
                .map_err(|source| CommandError::InvalidProduct { index, source })
        })
        .collect()
}

fn randomize_flags(catalog: &mut [NewProduct], rng: &mut impl Rng) {
    for product in catalog {
        product.is_new = rng.random_bool(0.5);
        product.is_on_sale = rng.random_bool(0.5);
        product.is_best_seller = rng.random_bool(0.5);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use tidewear_core::Price;

    use super::*;

    #[test]
    fn test_default_catalog_parses() {
        let catalog = parse_catalog(DEFAULT_CATALOG).unwrap();
        assert_eq!(catalog.len(), 15);

        let first = &catalog[0];
        assert_eq!(first.name, "Nike Air Max");
        assert_eq!(first.price, Price::from_cents(12_000).unwrap());
        assert_eq!(first.category, "Shoes");
        assert_eq!(first.quantity, 0);

        let mut categories: Vec<&str> = catalog.iter().map(|p| p.category.as_str()).collect();
        categories.sort_unstable();
        categories.dedup();
        assert_eq!(categories, ["Bags", "Men", "Shoes", "Women"]);
    }

    #[test]
    fn test_invalid_entry_is_reported_by_index() {
        let yaml = r"
products:
  - name: Cap
    price: '10.00'
    img: images/cap.jpg
    category: Men
  - name: Scarf
    img: images/scarf.jpg
    category: Women
";
        let err = parse_catalog(yaml).unwrap_err();
        assert!(matches!(err, CommandError::InvalidProduct { index: 1, .. }));
    }

    #[test]
    fn test_randomize_flags_keeps_other_fields() {
        let mut catalog = parse_catalog(DEFAULT_CATALOG).unwrap();
        let before = catalog.clone();

        randomize_flags(&mut catalog, &mut rand::rng());

        for (old, new) in before.iter().zip(&catalog) {
            assert_eq!(old.name, new.name);
            assert_eq!(old.price, new.price);
            assert_eq!(old.quantity, new.quantity);
        }
    }
}
