use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderDraft, OrderStatus};
use crate::domain::ports::OrderRepository;
use crate::domain::product::Product;
use crate::domain::stock::validate_lines;
use crate::schema::{order_items, orders, products};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow, ProductRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn load_items(conn: &mut PgConnection, order_id: Uuid) -> QueryResult<Vec<OrderItemRow>> {
    order_items::table
        .filter(order_items::order_id.eq(order_id))
        .select(OrderItemRow::as_select())
        .load(conn)
}

impl OrderRepository for DieselOrderRepository {
    fn place_order(&self, draft: OrderDraft) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Lock the referenced product rows. Locking in id order keeps two
            //    checkouts over the same products from deadlocking.
            let mut ids: Vec<Uuid> = draft.lines.iter().map(|l| l.product_id).collect();
            ids.sort();
            ids.dedup();
            let locked: Vec<Product> = products::table
                .select(ProductRow::as_select())
                .filter(products::id.eq_any(&ids))
                .order(products::id.asc())
                .for_update()
                .load(conn)?
                .into_iter()
                .map(Product::from)
                .collect();

            // 2. Re-validate against the locked stock; any failure rolls back.
            validate_lines(&draft.lines, &locked).into_result()?;

            // 3. Insert the order
            let order_id = Uuid::new_v4();
            let order = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    user_id: draft.user_id,
                    first_name: draft.contact.first_name.clone(),
                    last_name: draft.contact.last_name.clone(),
                    email: draft.contact.email.clone(),
                    phone: draft.contact.phone.clone(),
                    address: draft.contact.address.clone(),
                    status: OrderStatus::Pending.as_str().to_string(),
                    paid: false,
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            // 4. Insert order items with the cart's price snapshots
            let new_items: Vec<NewOrderItemRow> = draft
                .lines
                .iter()
                .map(|l| NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: l.product_id,
                    price: l.price.clone(),
                    quantity: l.quantity,
                })
                .collect();
            let items = if new_items.is_empty() {
                Vec::new()
            } else {
                diesel::insert_into(order_items::table)
                    .values(&new_items)
                    .returning(OrderItemRow::as_returning())
                    .get_results(conn)?
            };

            // 5. Decrement stock on the rows locked in step 1
            let now = Utc::now();
            for line in &draft.lines {
                diesel::update(products::table.find(line.product_id))
                    .set((
                        products::stock.eq(products::stock - line.quantity),
                        products::updated_at.eq(now),
                    ))
                    .execute(conn)?;
            }

            order.into_order(items)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = load_items(&mut conn, order.id)?;
        order.into_order(items).map(Some)
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .filter(orders::user_id.eq(user_id))
            .select(OrderRow::as_select())
            .order(orders::created_at.desc())
            .load(&mut conn)?;

        let items = OrderItemRow::belonging_to(&rows)
            .select(OrderItemRow::as_select())
            .load(&mut conn)?
            .grouped_by(&rows);

        rows.into_iter()
            .zip(items)
            .map(|(order, items)| order.into_order(items))
            .collect()
    }

    fn update_status(
        &self,
        id: Uuid,
        from: &[OrderStatus],
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let mut conn = self.pool.get()?;
        let allowed: Vec<String> = from.iter().map(|s| s.as_str().to_string()).collect();

        conn.transaction::<_, DomainError, _>(|conn| {
            // The status guard sits in the UPDATE's WHERE clause, so two racing
            // transitions cannot both match.
            let updated = diesel::update(
                orders::table
                    .filter(orders::id.eq(id))
                    .filter(orders::status.eq_any(allowed)),
            )
            .set((
                orders::status.eq(status.as_str()),
                orders::updated_at.eq(Utc::now()),
            ))
            .returning(OrderRow::as_returning())
            .get_result(conn)
            .optional()?;

            let Some(order) = updated else {
                let current: Option<String> = orders::table
                    .filter(orders::id.eq(id))
                    .select(orders::status)
                    .first(conn)
                    .optional()?;
                return Err(match current {
                    Some(current) => {
                        DomainError::InvalidInput(format!("order {id} is already {current}"))
                    }
                    None => DomainError::NotFound("order"),
                });
            };

            let items = load_items(conn, order.id)?;
            order.into_order(items)
        })
    }
}
