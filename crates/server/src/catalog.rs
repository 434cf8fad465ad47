//! In-memory storefront data: categories, products, users and orders.
//!
//! The catalog is the slow "source of truth" the cache sits in front of.
//! Deletes are soft (`deleted_at`), and list queries hide trashed rows unless
//! asked. Product views embed their category name and order views embed
//! user and product names, which is why writes to those resources stale
//! list caches beyond their own.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shelf_core::Error;
use shelf_core::config::MAX_PER_PAGE;
use tokio::sync::RwLock;

const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A product joined with its category name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub notes: Option<String>,
    pub order_date: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An order line joined with its product and category names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineView {
    #[serde(flatten)]
    pub line: OrderLine,
    pub product_name: Option<String>,
    pub category_name: Option<String>,
}

/// An order joined with its user and product names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: i64,
    pub order_number: String,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub notes: Option<String>,
    pub order_date: DateTime<Utc>,
    pub lines: Vec<OrderLineView>,
}

/// One page of a list query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
    pub last_page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Pagination and ordering for list queries. `None` fields take defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListOptions {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_column: Option<String>,
    pub sort_direction: Option<SortDirection>,
}

impl ListOptions {
    fn resolve(&self, default_per_page: u32, columns: &[&str]) -> Result<ResolvedList, Error> {
        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(Error::InvalidInput("page must be at least 1".into()));
        }

        let per_page = self.per_page.unwrap_or(default_per_page);
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(Error::InvalidInput(format!("per_page must be between 1 and {MAX_PER_PAGE}")));
        }

        let column = self.sort_column.clone().unwrap_or_else(|| "id".to_string());
        if !columns.contains(&column.as_str()) {
            return Err(Error::InvalidInput(format!(
                "sort_column must be one of: {}",
                columns.join(", ")
            )));
        }

        Ok(ResolvedList { page, per_page, column, descending: self.sort_direction != Some(SortDirection::Asc) })
    }
}

struct ResolvedList {
    page: u32,
    per_page: u32,
    column: String,
    descending: bool,
}

impl ResolvedList {
    fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let per_page = self.per_page as usize;
        let last_page = total.div_ceil(per_page).max(1) as u32;
        let start = (self.page as usize - 1).saturating_mul(per_page);

        Page {
            items: items.into_iter().skip(start).take(per_page).collect(),
            page: self.page,
            per_page: self.per_page,
            total,
            last_page,
        }
    }
}

/// Parse a date filter given as RFC 3339 or `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(field: &str, value: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| Error::InvalidInput(format!("{field} must be a date (YYYY-MM-DD) or RFC 3339 timestamp")))
}

fn within(ts: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.is_none_or(|from| ts >= from) && to.is_none_or(|to| ts <= to)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn starts_with_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().starts_with(&needle.to_lowercase())
}

fn validate_name(kind: &str, name: &str) -> Result<String, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput(format!("{kind} name cannot be empty")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::InvalidInput(format!("{kind} name must be at most {MAX_NAME_LEN} characters")));
    }
    Ok(name.to_string())
}

/// Product list filters. Absent fields do not filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProductFilter {
    /// Substring match on name or description.
    pub q: Option<String>,
    /// Case-insensitive name prefix.
    pub name: Option<String>,
    pub category_id: Option<i64>,
    /// Exact category name, case-insensitive.
    pub category_name: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Include soft-deleted products.
    #[serde(default)]
    pub with_trashed: bool,
}

/// Category list filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CategoryFilter {
    /// Substring match on name.
    pub q: Option<String>,
    #[serde(default)]
    pub with_trashed: bool,
}

/// Order list filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct OrderFilter {
    pub user_id: Option<i64>,
    /// Substring match on the ordering user's name.
    pub user_name: Option<String>,
    pub status: Option<OrderStatus>,
    pub order_number: Option<String>,
    /// Orders containing a product whose name contains this.
    pub product_name: Option<String>,
    /// Orders containing a product from one of these categories.
    pub category_ids: Option<Vec<i64>>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Fields for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub category_id: i64,
}

/// Fields for updating a product. Absent fields are unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub category_id: Option<i64>,
}

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OrderItem {
    pub product_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Default)]
struct State {
    categories: BTreeMap<i64, Category>,
    products: BTreeMap<i64, Product>,
    users: BTreeMap<i64, User>,
    orders: BTreeMap<i64, Order>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn live_category(&self, id: i64) -> Result<&Category, Error> {
        self.categories
            .get(&id)
            .filter(|c| c.deleted_at.is_none())
            .ok_or_else(|| Error::NotFound(format!("category {id}")))
    }

    fn product_view(&self, product: &Product) -> ProductView {
        ProductView {
            category_name: self.categories.get(&product.category_id).map(|c| c.name.clone()),
            product: product.clone(),
        }
    }

    fn order_view(&self, order: &Order) -> OrderView {
        let lines = order
            .lines
            .iter()
            .map(|line| {
                let product = self.products.get(&line.product_id);
                OrderLineView {
                    line: line.clone(),
                    product_name: product.map(|p| p.name.clone()),
                    category_name: product
                        .and_then(|p| self.categories.get(&p.category_id))
                        .map(|c| c.name.clone()),
                }
            })
            .collect();

        OrderView {
            id: order.id,
            order_number: order.order_number.clone(),
            user_id: order.user_id,
            user_name: self.users.get(&order.user_id).map(|u| u.name.clone()),
            status: order.status,
            total_amount: order.total_amount,
            notes: order.notes.clone(),
            order_date: order.order_date,
            lines,
        }
    }

    fn ensure_unique_product_name(&self, name: &str, except: Option<i64>) -> Result<(), Error> {
        let taken = self
            .products
            .values()
            .any(|p| Some(p.id) != except && p.name.eq_ignore_ascii_case(name));
        if taken { Err(Error::Conflict(format!("product name {name:?} is already taken"))) } else { Ok(()) }
    }

    fn ensure_unique_category_name(&self, name: &str, except: Option<i64>) -> Result<(), Error> {
        let taken = self
            .categories
            .values()
            .any(|c| Some(c.id) != except && c.name.eq_ignore_ascii_case(name));
        if taken { Err(Error::Conflict(format!("category name {name:?} is already taken"))) } else { Ok(()) }
    }
}

fn sort_by_column<T>(items: &mut [T], descending: bool, key: impl Fn(&T, &T) -> std::cmp::Ordering) {
    items.sort_by(|a, b| if descending { key(b, a) } else { key(a, b) });
}

/// The storefront's data, shared behind an async RwLock.
#[derive(Debug, Default)]
pub struct Catalog {
    state: RwLock<State>,
}

impl Catalog {
    pub const PRODUCT_COLUMNS: &'static [&'static str] = &["id", "name", "price", "stock", "category_id", "created_at"];
    pub const CATEGORY_COLUMNS: &'static [&'static str] = &["id", "name", "created_at"];
    pub const ORDER_COLUMNS: &'static [&'static str] =
        &["id", "order_number", "user_id", "total_amount", "status", "order_date"];

    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, Error> {
        let name = validate_name("category", name)?;
        let mut state = self.state.write().await;
        state.ensure_unique_category_name(&name, None)?;

        let category = Category { id: state.next_id(), name, created_at: Utc::now(), deleted_at: None };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    pub async fn update_category(&self, id: i64, name: &str) -> Result<Category, Error> {
        let name = validate_name("category", name)?;
        let mut state = self.state.write().await;
        state.ensure_unique_category_name(&name, Some(id))?;

        let category = state
            .categories
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("category {id}")))?;
        category.name = name;
        Ok(category.clone())
    }

    /// Soft-delete or restore a category.
    pub async fn set_category_active(&self, id: i64, active: bool) -> Result<Category, Error> {
        let mut state = self.state.write().await;
        let category = state
            .categories
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("category {id}")))?;
        category.deleted_at = if active { None } else { Some(Utc::now()) };
        Ok(category.clone())
    }

    pub async fn list_categories(
        &self, filter: &CategoryFilter, options: &ListOptions, default_per_page: u32,
    ) -> Result<Page<Category>, Error> {
        let list = options.resolve(default_per_page, Self::CATEGORY_COLUMNS)?;
        let state = self.state.read().await;

        let mut items: Vec<Category> = state
            .categories
            .values()
            .filter(|c| filter.with_trashed || c.deleted_at.is_none())
            .filter(|c| filter.q.as_deref().is_none_or(|q| contains_ci(&c.name, q)))
            .cloned()
            .collect();

        sort_by_column(&mut items, list.descending, |a, b| match list.column.as_str() {
            "name" => a.name.cmp(&b.name),
            "created_at" => a.created_at.cmp(&b.created_at),
            _ => a.id.cmp(&b.id),
        });

        Ok(list.paginate(items))
    }

    pub async fn create_product(&self, new: NewProduct) -> Result<ProductView, Error> {
        let name = validate_name("product", &new.name)?;
        if new.price < 0.0 || !new.price.is_finite() {
            return Err(Error::InvalidInput("price must be a non-negative number".into()));
        }
        if new.stock < 0 {
            return Err(Error::InvalidInput("stock must not be negative".into()));
        }

        let mut state = self.state.write().await;
        state.live_category(new.category_id)?;
        state.ensure_unique_product_name(&name, None)?;

        let product = Product {
            id: state.next_id(),
            name,
            description: new.description,
            price: new.price,
            stock: new.stock,
            category_id: new.category_id,
            created_at: Utc::now(),
            deleted_at: None,
        };
        state.products.insert(product.id, product.clone());
        Ok(state.product_view(&product))
    }

    pub async fn update_product(&self, id: i64, changes: ProductChanges) -> Result<ProductView, Error> {
        let name = changes.name.as_deref().map(|n| validate_name("product", n)).transpose()?;
        if changes.price.is_some_and(|p| p < 0.0 || !p.is_finite()) {
            return Err(Error::InvalidInput("price must be a non-negative number".into()));
        }
        if changes.stock.is_some_and(|s| s < 0) {
            return Err(Error::InvalidInput("stock must not be negative".into()));
        }

        let mut state = self.state.write().await;
        if !state.products.contains_key(&id) {
            return Err(Error::NotFound(format!("product {id}")));
        }
        if let Some(category_id) = changes.category_id {
            state.live_category(category_id)?;
        }
        if let Some(name) = &name {
            state.ensure_unique_product_name(name, Some(id))?;
        }

        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("product {id}")))?;
        if let Some(name) = name {
            product.name = name;
        }
        if changes.description.is_some() {
            product.description = changes.description;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(stock) = changes.stock {
            product.stock = stock;
        }
        if let Some(category_id) = changes.category_id {
            product.category_id = category_id;
        }

        let product = product.clone();
        Ok(state.product_view(&product))
    }

    /// Soft-delete or restore a product.
    pub async fn set_product_active(&self, id: i64, active: bool) -> Result<ProductView, Error> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("product {id}")))?;
        product.deleted_at = if active { None } else { Some(Utc::now()) };

        let product = product.clone();
        Ok(state.product_view(&product))
    }

    pub async fn get_product(&self, id: i64, with_trashed: bool) -> Result<ProductView, Error> {
        let state = self.state.read().await;
        state
            .products
            .get(&id)
            .filter(|p| with_trashed || p.deleted_at.is_none())
            .map(|p| state.product_view(p))
            .ok_or_else(|| Error::NotFound(format!("product {id}")))
    }

    pub async fn list_products(
        &self, filter: &ProductFilter, options: &ListOptions, default_per_page: u32,
    ) -> Result<Page<ProductView>, Error> {
        let list = options.resolve(default_per_page, Self::PRODUCT_COLUMNS)?;
        let date_from = filter.date_from.as_deref().map(|d| parse_date("date_from", d)).transpose()?;
        let date_to = filter.date_to.as_deref().map(|d| parse_date("date_to", d)).transpose()?;

        let state = self.state.read().await;
        let mut items: Vec<ProductView> = state
            .products
            .values()
            .filter(|p| filter.with_trashed || p.deleted_at.is_none())
            .filter(|p| filter.category_id.is_none_or(|id| p.category_id == id))
            .filter(|p| filter.min_price.is_none_or(|min| p.price >= min))
            .filter(|p| filter.max_price.is_none_or(|max| p.price <= max))
            .filter(|p| filter.name.as_deref().is_none_or(|n| starts_with_ci(&p.name, n)))
            .filter(|p| {
                filter.q.as_deref().is_none_or(|q| {
                    contains_ci(&p.name, q) || p.description.as_deref().is_some_and(|d| contains_ci(d, q))
                })
            })
            .filter(|p| within(p.created_at, date_from, date_to))
            .map(|p| state.product_view(p))
            .filter(|v| {
                filter.category_name.as_deref().is_none_or(|name| {
                    v.category_name.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(name))
                })
            })
            .collect();

        sort_by_column(&mut items, list.descending, |a, b| {
            let (a, b) = (&a.product, &b.product);
            match list.column.as_str() {
                "name" => a.name.cmp(&b.name),
                "price" => a.price.total_cmp(&b.price),
                "stock" => a.stock.cmp(&b.stock),
                "category_id" => a.category_id.cmp(&b.category_id),
                "created_at" => a.created_at.cmp(&b.created_at),
                _ => a.id.cmp(&b.id),
            }
        });

        Ok(list.paginate(items))
    }

    pub async fn create_user(&self, name: &str) -> Result<User, Error> {
        let name = validate_name("user", name)?;
        let mut state = self.state.write().await;
        let user = User { id: state.next_id(), name, created_at: Utc::now() };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn update_user(&self, id: i64, name: &str) -> Result<User, Error> {
        let name = validate_name("user", name)?;
        let mut state = self.state.write().await;
        let user = state.users.get_mut(&id).ok_or_else(|| Error::NotFound(format!("user {id}")))?;
        user.name = name;
        Ok(user.clone())
    }

    /// Place an order, decrementing stock. Either every line is applied or
    /// none is.
    pub async fn place_order(&self, user_id: i64, items: &[OrderItem], notes: Option<String>) -> Result<OrderView, Error> {
        if items.is_empty() {
            return Err(Error::InvalidInput("an order needs at least one item".into()));
        }
        if items.iter().any(|i| i.quantity == 0) {
            return Err(Error::InvalidInput("quantity must be at least 1".into()));
        }

        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(Error::NotFound(format!("user {user_id}")));
        }

        let mut requested: BTreeMap<i64, i64> = BTreeMap::new();
        for item in items {
            *requested.entry(item.product_id).or_default() += i64::from(item.quantity);
        }

        for (product_id, quantity) in &requested {
            let product = state
                .products
                .get(product_id)
                .filter(|p| p.deleted_at.is_none())
                .ok_or_else(|| Error::NotFound(format!("product {product_id}")))?;
            if product.stock < *quantity {
                return Err(Error::Conflict(format!(
                    "insufficient stock for product {}: available {}, requested {quantity}",
                    product.name, product.stock
                )));
            }
        }

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            if let Some(product) = state.products.get_mut(&item.product_id) {
                product.stock -= i64::from(item.quantity);
                let total_price = product.price * f64::from(item.quantity);
                lines.push(OrderLine {
                    product_id: product.id,
                    quantity: item.quantity,
                    unit_price: product.price,
                    total_price,
                });
            }
        }

        let id = state.next_id();
        let order = Order {
            id,
            order_number: format!("ORD-{id:08X}"),
            user_id,
            status: OrderStatus::default(),
            total_amount: lines.iter().map(|l| l.total_price).sum(),
            notes,
            order_date: Utc::now(),
            lines,
            deleted_at: None,
        };
        state.orders.insert(order.id, order.clone());
        Ok(state.order_view(&order))
    }

    pub async fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<OrderView, Error> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .filter(|o| o.deleted_at.is_none())
            .ok_or_else(|| Error::NotFound(format!("order {id}")))?;
        order.status = status;

        let order = order.clone();
        Ok(state.order_view(&order))
    }

    /// Soft-delete an order and return its stock to the products.
    pub async fn delete_order(&self, id: i64) -> Result<OrderView, Error> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .filter(|o| o.deleted_at.is_none())
            .ok_or_else(|| Error::NotFound(format!("order {id}")))?;
        order.deleted_at = Some(Utc::now());

        let order = order.clone();
        for line in &order.lines {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.stock += i64::from(line.quantity);
            }
        }
        Ok(state.order_view(&order))
    }

    pub async fn list_orders(
        &self, filter: &OrderFilter, options: &ListOptions, default_per_page: u32,
    ) -> Result<Page<OrderView>, Error> {
        let list = options.resolve(default_per_page, Self::ORDER_COLUMNS)?;
        let date_from = filter.date_from.as_deref().map(|d| parse_date("date_from", d)).transpose()?;
        let date_to = filter.date_to.as_deref().map(|d| parse_date("date_to", d)).transpose()?;

        let state = self.state.read().await;
        let in_categories = |order: &Order, ids: &[i64]| {
            order.lines.iter().any(|line| {
                state
                    .products
                    .get(&line.product_id)
                    .is_some_and(|p| ids.contains(&p.category_id))
            })
        };

        let mut items: Vec<OrderView> = state
            .orders
            .values()
            .filter(|o| o.deleted_at.is_none())
            .filter(|o| filter.user_id.is_none_or(|id| o.user_id == id))
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .filter(|o| filter.order_number.as_deref().is_none_or(|n| starts_with_ci(&o.order_number, n)))
            .filter(|o| filter.category_ids.as_deref().is_none_or(|ids| in_categories(o, ids)))
            .filter(|o| within(o.order_date, date_from, date_to))
            .map(|o| state.order_view(o))
            .filter(|v| {
                filter
                    .user_name
                    .as_deref()
                    .is_none_or(|n| v.user_name.as_deref().is_some_and(|u| contains_ci(u, n)))
            })
            .filter(|v| {
                filter.product_name.as_deref().is_none_or(|n| {
                    v.lines
                        .iter()
                        .any(|l| l.product_name.as_deref().is_some_and(|p| contains_ci(p, n)))
                })
            })
            .collect();

        sort_by_column(&mut items, list.descending, |a, b| match list.column.as_str() {
            "order_number" => a.order_number.cmp(&b.order_number),
            "user_id" => a.user_id.cmp(&b.user_id),
            "total_amount" => a.total_amount.total_cmp(&b.total_amount),
            "status" => a.status.as_str().cmp(b.status.as_str()),
            "order_date" => a.order_date.cmp(&b.order_date),
            _ => a.id.cmp(&b.id),
        });

        Ok(list.paginate(items))
    }
}
