//! Order business logic - creation, lookups and administration.
//!
//! Orders are created in the `PENDING` state with their item snapshots in a
//! single database transaction. Status changes after creation all go through
//! [`crate::core::reconcile::apply_status`] so stock and wallet side effects
//! stay consistent whichever route triggered them.

use crate::{
    config::AppConfig,
    core::{
        checkout::{CheckoutParams, checkout_params},
        pricing::{self, PricedLine, Quote},
        product,
        reconcile::{self, Transition},
        reference::{self, PaymentMethod},
        status::OrderStatus,
    },
    entities::{Order, OrderItem, order, order_item, product as product_entity},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

/// Product image as sent by the storefront: a single URL or a gallery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    One(String),
    Many(Vec<String>),
}

impl ImageRef {
    /// The image stored on the order line (first of a gallery).
    #[must_use]
    pub fn primary(&self) -> Option<String> {
        match self {
            Self::One(url) => Some(url.clone()).filter(|u| !u.is_empty()),
            Self::Many(urls) => urls.iter().find(|u| !u.is_empty()).cloned(),
        }
    }
}

/// A cart line as submitted by the storefront.
///
/// Client-side names and prices are ignored; the catalog is authoritative.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub size_range: Option<String>,
}

/// Buyer and shipping details for a gateway order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
    pub email: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub document_type: Option<String>,
    pub document: Option<String>,
}

/// Delivery details with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buyer {
    pub email: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    pub document_type: String,
    pub document_number: String,
}

fn required(value: Option<&String>, field: &'static str) -> Result<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(Error::IncompleteDeliveryInfo { field })
}

impl DeliveryInfo {
    /// Checks that every field the gateway needs is present and non-blank.
    ///
    /// # Errors
    /// `IncompleteDeliveryInfo` naming the first missing field.
    pub fn validate(&self) -> Result<Buyer> {
        Ok(Buyer {
            email: required(self.email.as_ref(), "email")?,
            name: required(self.name.as_ref(), "name")?,
            address: required(self.address.as_ref(), "address")?,
            phone: required(self.phone.as_ref(), "phone")?,
            document_type: required(self.document_type.as_ref(), "documentType")?,
            document_number: required(self.document.as_ref(), "document")?,
            city: self
                .city
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or("N/A")
                .to_string(),
        })
    }
}

/// Request body for creating a gateway order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub delivery_info: DeliveryInfo,
    #[serde(default)]
    pub tip: f64,
    /// Total the storefront displayed, checked against the server quote
    #[serde(default)]
    pub total: Option<f64>,
}

/// A cart line joined with its catalog product.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product: product_entity::Model,
    pub item: CartItem,
}

impl CartLine {
    fn priced(&self) -> PricedLine {
        PricedLine {
            product_id: self.product.id,
            unit_price: self.product.price,
            quantity: self.item.quantity,
        }
    }
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Response for a freshly created gateway order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: i64,
    pub reference_code: String,
    pub quote: Quote,
    pub checkout: CheckoutParams,
}

/// Everything needed to insert an order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub reference_code: String,
    pub clerk_id: String,
    pub payment_method: PaymentMethod,
    pub quote: Quote,
    pub currency: String,
    pub buyer: Buyer,
    pub shipping_country: String,
}

/// Loads the catalog product for each cart item and checks availability.
///
/// Quantities for the same product are summed before comparing with stock.
///
/// # Errors
/// `EmptyOrder`, `InvalidQuantity`, `ProductNotFound` or `InsufficientStock`.
pub async fn load_cart<C>(db: &C, items: &[CartItem]) -> Result<Vec<CartLine>>
where
    C: ConnectionTrait,
{
    if items.is_empty() {
        return Err(Error::EmptyOrder);
    }

    let mut requested: BTreeMap<i64, i64> = BTreeMap::new();
    for item in items {
        if item.quantity <= 0 {
            return Err(Error::InvalidQuantity {
                product_id: item.id,
                quantity: item.quantity,
            });
        }
        let total = requested.entry(item.id).or_default();
        *total = total
            .checked_add(item.quantity)
            .ok_or(Error::InvalidQuantity {
                product_id: item.id,
                quantity: item.quantity,
            })?;
    }

    let mut products: HashMap<i64, product_entity::Model> = HashMap::new();
    for (&product_id, &quantity) in &requested {
        let product = product::get_product_by_id(db, product_id)
            .await?
            .ok_or_else(|| Error::ProductNotFound {
                id: product_id.to_string(),
            })?;
        if product.quantity < quantity {
            warn!(
                product_id,
                available = product.quantity,
                requested = quantity,
                "Insufficient stock"
            );
            return Err(Error::InsufficientStock {
                product: product.name,
            });
        }
        products.insert(product_id, product);
    }

    items
        .iter()
        .map(|item| {
            products
                .get(&item.id)
                .cloned()
                .map(|product| CartLine {
                    product,
                    item: item.clone(),
                })
                .ok_or_else(|| Error::ProductNotFound {
                    id: item.id.to_string(),
                })
        })
        .collect()
}

/// Prices loaded cart lines.
pub fn quote_cart(lines: &[CartLine], tax_rate: f64, tip: f64) -> Result<Quote> {
    let priced: Vec<PricedLine> = lines.iter().map(CartLine::priced).collect();
    pricing::quote(&priced, tax_rate, tip)
}

/// Inserts a `PENDING` order row.
pub async fn insert_order<C>(db: &C, new_order: NewOrder) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    let order = order::ActiveModel {
        reference_code: Set(new_order.reference_code),
        clerk_id: Set(new_order.clerk_id),
        payment_method: Set(new_order.payment_method.as_str().to_string()),
        amount: Set(new_order.quote.total),
        tax: Set(new_order.quote.tax),
        tax_base: Set(new_order.quote.tax_base()),
        tip: Set(new_order.quote.tip),
        currency: Set(new_order.currency),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        transaction_id: Set(None),
        ref_payco: Set(None),
        processing_date: Set(None),
        buyer_email: Set(new_order.buyer.email),
        buyer_name: Set(new_order.buyer.name),
        shipping_address: Set(new_order.buyer.address),
        shipping_city: Set(new_order.buyer.city),
        shipping_country: Set(new_order.shipping_country),
        phone: Set(new_order.buyer.phone),
        document_type: Set(new_order.buyer.document_type),
        document_number: Set(new_order.buyer.document_number),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    order.insert(db).await.map_err(Into::into)
}

/// Inserts the item snapshots for an order.
pub async fn insert_order_items<C>(
    db: &C,
    order_id: i64,
    lines: &[CartLine],
) -> Result<Vec<order_item::Model>>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = order_item::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(line.product.id),
            name: Set(line.product.name.clone()),
            price: Set(line.product.price),
            quantity: Set(line.item.quantity),
            image: Set(line.item.image.as_ref().and_then(ImageRef::primary)),
            color: Set(line.item.color.clone()),
            size: Set(line.item.size.clone()),
            size_range: Set(line.item.size_range.clone()),
            created_at: Set(now),
            ..Default::default()
        };
        items.push(item.insert(db).await?);
    }
    Ok(items)
}

/// Creates a `PENDING` order to be paid through the hosted gateway checkout.
///
/// Stock is checked but not taken; it is reserved when the gateway confirms
/// the payment.
pub async fn create_gateway_order(
    db: &DatabaseConnection,
    config: &AppConfig,
    clerk_id: &str,
    request: CheckoutRequest,
) -> Result<CreatedOrder> {
    let buyer = request.delivery_info.validate()?;

    let txn = db.begin().await?;
    let lines = load_cart(&txn, &request.items).await?;
    let quote = quote_cart(&lines, config.payments.tax_rate, request.tip)?;
    pricing::reconcile(&quote, request.total)?;

    let order = insert_order(
        &txn,
        NewOrder {
            reference_code: reference::gateway_reference(),
            clerk_id: clerk_id.to_string(),
            payment_method: PaymentMethod::Epayco,
            quote,
            currency: config.payments.currency.clone(),
            buyer,
            shipping_country: config.payments.shipping_country.clone(),
        },
    )
    .await?;
    insert_order_items(&txn, order.id, &lines).await?;
    txn.commit().await?;

    info!(
        order_id = order.id,
        reference = %order.reference_code,
        amount = order.amount,
        "Gateway order created"
    );

    Ok(CreatedOrder {
        order_id: order.id,
        reference_code: order.reference_code.clone(),
        quote,
        checkout: checkout_params(config, &order),
    })
}

/// Fetches the line items of one order.
pub async fn get_order_items<C>(db: &C, order_id: i64) -> Result<Vec<order_item::Model>>
where
    C: ConnectionTrait,
{
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an order by its gateway reference code.
pub async fn get_order_by_reference<C>(db: &C, reference: &str) -> Result<Option<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::ReferenceCode.eq(reference))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads an order and its items.
///
/// # Errors
/// `OrderNotFound` if no order has this id.
pub async fn get_order_detail(db: &DatabaseConnection, order_id: i64) -> Result<OrderDetail> {
    let order = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::OrderNotFound {
            reference: order_id.to_string(),
        })?;
    let items = get_order_items(db, order_id).await?;
    Ok(OrderDetail { order, items })
}

async fn attach_items(
    db: &DatabaseConnection,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderDetail>> {
    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<i64, Vec<order_item::Model>> = HashMap::new();
    if !ids.is_empty() {
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.is_in(ids))
            .order_by_asc(order_item::Column::Id)
            .all(db)
            .await?;
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderDetail {
            items: by_order.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect())
}

/// All orders placed by a user, newest first, with their items.
pub async fn orders_for_user(db: &DatabaseConnection, clerk_id: &str) -> Result<Vec<OrderDetail>> {
    let orders = Order::find()
        .filter(order::Column::ClerkId.eq(clerk_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;
    attach_items(db, orders).await
}

/// Total number of orders.
pub async fn count_orders(db: &DatabaseConnection) -> Result<u64> {
    Order::find().count(db).await.map_err(Into::into)
}

/// Listing parameters for the admin order table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersQuery {
    /// 1-based page number
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Only orders paid with this method
    #[serde(alias = "type")]
    pub method: Option<PaymentMethod>,
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub items_per_page: u64,
}

/// One page of orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPage {
    pub orders: Vec<OrderDetail>,
    pub pagination: Pagination,
}

/// Pages through all orders, newest first.
///
/// `page` starts at 1; `limit` is clamped to 1..=100 and defaults to 10.
pub async fn list_orders(db: &DatabaseConnection, query: ListOrdersQuery) -> Result<OrderPage> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let mut select = Order::find();
    if let Some(method) = query.method {
        select = select.filter(order::Column::PaymentMethod.eq(method.as_str()));
    }
    let paginator = select
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .paginate(db, limit);

    let total = paginator.num_items().await?;
    let orders = paginator.fetch_page(page - 1).await?;

    Ok(OrderPage {
        orders: attach_items(db, orders).await?,
        pagination: Pagination {
            total,
            page,
            items_per_page: limit,
        },
    })
}

/// Administrative status override.
///
/// Applies the same side effects as a gateway confirmation: entering
/// `APPROVED` takes stock (and debits the wallet for balance orders), leaving
/// it gives them back.
pub async fn update_status(
    db: &DatabaseConnection,
    order_id: i64,
    status: OrderStatus,
) -> Result<Transition> {
    let txn = db.begin().await?;
    let order = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::OrderNotFound {
            reference: order_id.to_string(),
        })?;
    let transition = reconcile::apply_status(&txn, order, status, None).await?;
    txn.commit().await?;

    info!(
        order_id,
        from = %transition.previous,
        to = %transition.status,
        "Order status updated by admin"
    );
    Ok(transition)
}
