// storefront/src/models/catalog.rs

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
  pub id: &'static str,
  pub label: &'static str,
  pub price_pence: i64,
  /// Lines with this option carry personalisation text and a font choice.
  pub requires_text: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: &'static str,
  pub name: &'static str,
  pub description: &'static str,
  pub image: &'static str,
  pub options: &'static [ProductOption],
  #[serde(skip_serializing_if = "Option::is_none")]
  pub font_guide_image: Option<&'static str>,
}

impl Product {
  pub fn option(&self, option_id: &str) -> Option<&'static ProductOption> {
    self.options.iter().find(|o| o.id == option_id)
  }

  pub fn default_option(&self) -> Option<&'static ProductOption> {
    self.options.first()
  }
}

pub const WALLET_PRODUCT_ID: &str = "metal-wallet-photo";

static PRODUCTS: &[Product] = &[
  Product {
    id: "steel-photo",
    name: "304 Stainless Steel Photo",
    description: "Personalised 304 stainless steel photo keepsake. Choose your size.",
    image: "/images/steel-photo.jpg",
    options: &[
      ProductOption {
        id: "steel-100x100",
        label: "100mm × 100mm — £20",
        price_pence: 2000,
        requires_text: false,
      },
      ProductOption {
        id: "steel-100x200",
        label: "100mm × 200mm — £40",
        price_pence: 4000,
        requires_text: false,
      },
    ],
    font_guide_image: None,
  },
  Product {
    id: WALLET_PRODUCT_ID,
    name: "Metal Wallet Photo Card",
    description: "Metal wallet photo card — keep your special moments with you at all times.",
    image: "/images/wallet-photo.jpg",
    options: &[
      ProductOption {
        id: "wallet-photo-only",
        label: "Photo only — £4",
        price_pence: 400,
        requires_text: false,
      },
      ProductOption {
        id: "wallet-photo-text",
        label: "Photo + custom text — £5.50",
        price_pence: 550,
        requires_text: true,
      },
    ],
    font_guide_image: Some("/images/wallet-fonts.jpg"),
  },
];

pub fn all() -> &'static [Product] {
  PRODUCTS
}

pub fn find(product_id: &str) -> Option<&'static Product> {
  PRODUCTS.iter().find(|p| p.id == product_id)
}
