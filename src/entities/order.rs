//! Order entity - A single cash-on-delivery purchase request.
//!
//! Each order captures a price snapshot (`unit_price`, `total`) at creation time and
//! keeps it regardless of later catalog changes. `product_id` is a plain lookup key:
//! no foreign-key constraint is declared, so deleting a product leaves its orders intact.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fulfillment stage of an order. Stored as the Spanish slug used by the back-office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OrderStatus {
    /// Placed, not yet handled
    #[sea_orm(string_value = "nuevo")]
    #[serde(rename = "nuevo")]
    New,
    /// Being prepared
    #[sea_orm(string_value = "en_proceso")]
    #[serde(rename = "en_proceso")]
    Processing,
    /// Handed to the carrier
    #[sea_orm(string_value = "enviado")]
    #[serde(rename = "enviado")]
    Shipped,
    /// Delivered; terminal
    #[sea_orm(string_value = "entregado")]
    #[serde(rename = "entregado")]
    Delivered,
    /// Cancelled without restock; terminal
    #[sea_orm(string_value = "cancelado")]
    #[serde(rename = "cancelado")]
    Cancelled,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Auto-increment id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Id of the ordered product; not a foreign key
    pub product_id: i64,
    /// Product name at order time, kept for the admin list after catalog edits
    pub product_name: String,
    /// Units ordered, at least 1
    pub quantity: i32,
    /// Product price at order time
    pub unit_price: Decimal,
    /// `unit_price * quantity` rounded to 2 places, frozen at creation
    pub total: Decimal,
    /// Shopper full name
    pub customer_name: String,
    /// Contact phone for delivery
    pub phone: String,
    /// Optional contact email
    pub email: Option<String>,
    /// National id number
    pub document_id: Option<String>,
    /// Delivery country
    pub country: String,
    /// Delivery city
    pub city: String,
    /// Street address
    pub address: String,
    /// Neighborhood (barrio)
    pub neighborhood: Option<String>,
    /// Delivery notes
    pub notes: Option<String>,
    /// Ad click id from the landing URL
    pub fbclid: Option<String>,
    /// `_fbc` click cookie
    pub fbc: Option<String>,
    /// `_fbp` browser cookie
    pub fbp: Option<String>,
    /// Browser `User-Agent`
    pub user_agent: Option<String>,
    /// Client address at checkout
    pub client_ip: Option<String>,
    /// Fulfillment stage
    pub status: OrderStatus,
    /// When the order was placed (UTC)
    pub created_at: DateTimeUtc,
    /// Last status change (UTC)
    pub updated_at: DateTimeUtc,
}

/// Orders hold no declared relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
