//! Product listing.

use doghouse_storefront::Storefront;
use doghouse_storefront::api::Product;
use doghouse_storefront::error::StorefrontError;

/// Print the product list.
///
/// # Errors
///
/// Returns an error if the product list cannot be fetched.
pub async fn list(storefront: &Storefront) -> Result<(), StorefrontError> {
    let products = storefront.catalog().products().await?;
    if products.is_empty() {
        println!("No products available.");
        return Ok(());
    }
    for product in products.iter() {
        println!("{}", format_product(product));
    }
    Ok(())
}

fn format_product(product: &Product) -> String {
    let mut line = format!(
        "{:>4}  {:<28} {:>10}",
        product.id.as_i32(),
        product.name,
        product.price.to_string()
    );
    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str("  ");
        line.push_str(description);
    }
    line
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use doghouse_core::{Price, ProductId};

    #[test]
    fn test_format_product() {
        let product = Product {
            id: ProductId::new(1),
            name: "Hotdog".to_string(),
            price: Price::from_centavos(7900).unwrap(),
            image_file: None,
            description: Some("Classic".to_string()),
        };
        let line = format_product(&product);
        assert!(line.starts_with("   1  Hotdog"));
        assert!(line.contains("₱79.00"));
        assert!(line.ends_with("Classic"));
    }
}
