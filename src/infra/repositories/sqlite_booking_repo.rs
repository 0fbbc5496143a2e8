use crate::domain::{models::booking::Booking, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::NaiveDate;

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, package_id, client_id, wedding_date, wedding_time, venue, special_requests, payment_method, payment_amount, receipt_ref, marketing_opt_in, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(booking.package_id).bind(&booking.client_id).bind(booking.wedding_date)
            .bind(booking.wedding_time).bind(&booking.venue).bind(&booking.special_requests).bind(&booking.payment_method)
            .bind(booking.payment_amount).bind(&booking.receipt_ref).bind(booking.marketing_opt_in).bind(&booking.status)
            .bind(booking.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_active_by_range(&self, package_id: i64, start: NaiveDate, end: NaiveDate) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE package_id = ? AND wedding_date >= ? AND wedding_date <= ? AND status NOT IN ('cancelled', 'rejected') ORDER BY wedding_date ASC"
        )
            .bind(package_id).bind(start).bind(end)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
