//! PostgreSQL catalog and reservation store.
//!
//! Queries are built at runtime with `sqlx::query`; the reservation row
//! and its service associations are written inside one transaction so
//! each store operation commits or rolls back as a unit.

use async_trait::async_trait;
use chrono::NaiveDate;
use errors::StoreError;
use ik_core::traits::{HotelCatalog, ReservationStore, RoomCatalog, ServiceCatalog};
use ik_core::types::{
    Hotel, HotelId, Reservation, ReservationFilter, ReservationId, ReservationStatus, Role, Room,
    RoomId, ServiceId, ServiceOffering, UserId, UserRef
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres, Row};

const BACKEND: &str = "postgres";

pub struct PostgresStore {
    pool: Pool<Postgres>
}

fn query_error(err: sqlx::Error) -> StoreError {
    StoreError::Query {
        backend: BACKEND.to_string(),
        reason: err.to_string()
    }
}

fn decode_error(reason: impl Into<String>) -> StoreError {
    StoreError::Serialization {
        reason: reason.into()
    }
}

impl PostgresStore {
    pub async fn connect(connection_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(connection_url)
            .await
            .map_err(|e| StoreError::Connection {
                backend: BACKEND.to_string(),
                reason: e.to_string()
            })?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS app_user (
                id BIGSERIAL PRIMARY KEY,
                name TEXT,
                email TEXT NOT NULL,
                username TEXT,
                role TEXT NOT NULL
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS hotel (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                stars SMALLINT NOT NULL,
                operator_id BIGINT NOT NULL REFERENCES app_user(id)
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS room (
                id BIGSERIAL PRIMARY KEY,
                number TEXT NOT NULL,
                room_type TEXT NOT NULL,
                price DOUBLE PRECISION NOT NULL,
                available BOOLEAN NOT NULL,
                hotel_id BIGINT NOT NULL REFERENCES hotel(id)
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS hotel_service (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                price DOUBLE PRECISION,
                hotel_id BIGINT NOT NULL REFERENCES hotel(id)
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS reservation (
                id BIGSERIAL PRIMARY KEY,
                start_date DATE NOT NULL,
                end_date DATE NOT NULL,
                booked_at TIMESTAMPTZ NOT NULL,
                status TEXT NOT NULL,
                total_amount DOUBLE PRECISION NOT NULL,
                client_id BIGINT NOT NULL REFERENCES app_user(id),
                room_id BIGINT NOT NULL REFERENCES room(id),
                hotel_id BIGINT NOT NULL REFERENCES hotel(id)
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS reservation_service (
                reservation_id BIGINT NOT NULL REFERENCES reservation(id) ON DELETE CASCADE,
                service_id BIGINT NOT NULL REFERENCES hotel_service(id),
                PRIMARY KEY (reservation_id, service_id)
            )"
        )
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        for statement in [
            "CREATE INDEX IF NOT EXISTS idx_reservation_client_id ON reservation(client_id)",
            "CREATE INDEX IF NOT EXISTS idx_reservation_hotel_id ON reservation(hotel_id)",
            "CREATE INDEX IF NOT EXISTS idx_reservation_status ON reservation(status)",
            "CREATE INDEX IF NOT EXISTS idx_room_hotel_id ON room(hotel_id)"
        ] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(query_error)?;
        }

        tracing::debug!("reservation schema initialized");
        Ok(())
    }

    // -------- seeding (catalog records are managed out of band) --------

    pub async fn insert_user(
        &self,
        name: Option<&str>,
        email: &str,
        username: Option<&str>,
        role: Role
    ) -> Result<UserId, StoreError> {
        let row = sqlx::query(
            "INSERT INTO app_user (name, email, username, role)
             VALUES ($1, $2, $3, $4) RETURNING id"
        )
        .bind(name)
        .bind(email)
        .bind(username)
        .bind(role.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;
        Ok(UserId::new(row.get("id")))
    }

    pub async fn insert_hotel(
        &self,
        name: &str,
        address: &str,
        stars: u8,
        operator: UserId
    ) -> Result<HotelId, StoreError> {
        let row = sqlx::query(
            "INSERT INTO hotel (name, address, stars, operator_id)
             VALUES ($1, $2, $3, $4) RETURNING id"
        )
        .bind(name)
        .bind(address)
        .bind(i16::from(stars))
        .bind(operator.get())
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;
        Ok(HotelId::new(row.get("id")))
    }

    pub async fn insert_room(
        &self,
        number: &str,
        room_type: &str,
        price: f64,
        available: bool,
        hotel_id: HotelId
    ) -> Result<RoomId, StoreError> {
        let row = sqlx::query(
            "INSERT INTO room (number, room_type, price, available, hotel_id)
             VALUES ($1, $2, $3, $4, $5) RETURNING id"
        )
        .bind(number)
        .bind(room_type)
        .bind(price)
        .bind(available)
        .bind(hotel_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;
        Ok(RoomId::new(row.get("id")))
    }

    pub async fn insert_service(
        &self,
        name: &str,
        description: Option<&str>,
        price: Option<f64>,
        hotel_id: HotelId
    ) -> Result<ServiceId, StoreError> {
        let row = sqlx::query(
            "INSERT INTO hotel_service (name, description, price, hotel_id)
             VALUES ($1, $2, $3, $4) RETURNING id"
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(hotel_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;
        Ok(ServiceId::new(row.get("id")))
    }

    pub async fn set_room_available(
        &self,
        id: RoomId,
        available: bool
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE room SET available = $2 WHERE id = $1")
            .bind(id.get())
            .bind(available)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(())
    }

    // -------- row mapping --------

    fn map_hotel(row: &sqlx::postgres::PgRow) -> Hotel {
        let stars: i16 = row.get("stars");
        Hotel {
            id: HotelId::new(row.get("id")),
            name: row.get("name"),
            address: row.get("address"),
            stars: stars as u8,
            operator: UserRef {
                id: UserId::new(row.get("operator_id")),
                email: row.get("operator_email"),
                username: row.get("operator_username")
            }
        }
    }

    fn map_reservation(
        row: &sqlx::postgres::PgRow,
        service_ids: Vec<ServiceId>
    ) -> Result<Reservation, StoreError> {
        let status_str: String = row.get("status");
        let status: ReservationStatus = status_str
            .parse()
            .map_err(|_| decode_error(format!("invalid reservation status: {status_str}")))?;

        Ok(Reservation {
            id: ReservationId::new(row.get("id")),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            booked_at: row.get("booked_at"),
            status,
            total_amount: row.get("total_amount"),
            customer: UserRef {
                id: UserId::new(row.get("client_id")),
                email: row.get("client_email"),
                username: row.get("client_username")
            },
            room_id: RoomId::new(row.get("room_id")),
            hotel_id: HotelId::new(row.get("hotel_id")),
            service_ids
        })
    }

    /// Service ids for a batch of reservations, keyed by reservation id.
    async fn service_ids_for(
        &self,
        reservation_ids: &[i64]
    ) -> Result<std::collections::HashMap<i64, Vec<ServiceId>>, StoreError> {
        let mut by_reservation: std::collections::HashMap<i64, Vec<ServiceId>> =
            std::collections::HashMap::new();
        if reservation_ids.is_empty() {
            return Ok(by_reservation);
        }

        let rows = sqlx::query(
            "SELECT reservation_id, service_id FROM reservation_service
             WHERE reservation_id = ANY($1)
             ORDER BY reservation_id, service_id"
        )
        .bind(reservation_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        for row in rows {
            let reservation_id: i64 = row.get("reservation_id");
            by_reservation
                .entry(reservation_id)
                .or_default()
                .push(ServiceId::new(row.get("service_id")));
        }
        Ok(by_reservation)
    }

    async fn collect_reservations(
        &self,
        rows: Vec<sqlx::postgres::PgRow>
    ) -> Result<Vec<Reservation>, StoreError> {
        let ids: Vec<i64> = rows.iter().map(|row| row.get("id")).collect();
        let mut services = self.service_ids_for(&ids).await?;

        let mut reservations = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.get("id");
            let service_ids = services.remove(&id).unwrap_or_default();
            reservations.push(Self::map_reservation(row, service_ids)?);
        }
        Ok(reservations)
    }
}

const RESERVATION_SELECT: &str = "SELECT r.id, r.start_date, r.end_date, r.booked_at, r.status, \
     r.total_amount, r.client_id, u.email AS client_email, u.username AS client_username, \
     r.room_id, r.hotel_id
     FROM reservation r
     JOIN app_user u ON u.id = r.client_id";

#[async_trait]
impl RoomCatalog for PostgresStore {
    async fn find_room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        let row = sqlx::query(
            "SELECT id, number, room_type, price, available, hotel_id FROM room WHERE id = $1"
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(row.map(|row| Room {
            id: RoomId::new(row.get("id")),
            number: row.get("number"),
            room_type: row.get("room_type"),
            price: row.get("price"),
            available: row.get("available"),
            hotel_id: HotelId::new(row.get("hotel_id"))
        }))
    }
}

#[async_trait]
impl ServiceCatalog for PostgresStore {
    async fn find_service(&self, id: ServiceId) -> Result<Option<ServiceOffering>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, description, price, hotel_id FROM hotel_service WHERE id = $1"
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(row.map(|row| ServiceOffering {
            id: ServiceId::new(row.get("id")),
            name: row.get("name"),
            description: row.get("description"),
            price: row.get("price"),
            hotel_id: HotelId::new(row.get("hotel_id"))
        }))
    }
}

#[async_trait]
impl HotelCatalog for PostgresStore {
    async fn find_hotel(&self, id: HotelId) -> Result<Option<Hotel>, StoreError> {
        let row = sqlx::query(
            "SELECT h.id, h.name, h.address, h.stars, u.id AS operator_id, \
             u.email AS operator_email, u.username AS operator_username
             FROM hotel h JOIN app_user u ON u.id = h.operator_id
             WHERE h.id = $1"
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(row.map(|row| Self::map_hotel(&row)))
    }

    async fn hotels_by_operator(&self, operator: UserId) -> Result<Vec<Hotel>, StoreError> {
        let rows = sqlx::query(
            "SELECT h.id, h.name, h.address, h.stars, u.id AS operator_id, \
             u.email AS operator_email, u.username AS operator_username
             FROM hotel h JOIN app_user u ON u.id = h.operator_id
             WHERE h.operator_id = $1"
        )
        .bind(operator.get())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(rows.iter().map(Self::map_hotel).collect())
    }
}

#[async_trait]
impl ReservationStore for PostgresStore {
    async fn insert(&self, reservation: Reservation) -> Result<Reservation, StoreError> {
        let mut tx = self.pool.begin().await.map_err(query_error)?;

        let row = sqlx::query(
            "INSERT INTO reservation (start_date, end_date, booked_at, status, total_amount, \
             client_id, room_id, hotel_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id"
        )
        .bind(reservation.start_date)
        .bind(reservation.end_date)
        .bind(reservation.booked_at)
        .bind(reservation.status.to_string())
        .bind(reservation.total_amount)
        .bind(reservation.customer.id.get())
        .bind(reservation.room_id.get())
        .bind(reservation.hotel_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?;

        let id = ReservationId::new(row.get("id"));
        for service_id in &reservation.service_ids {
            sqlx::query(
                "INSERT INTO reservation_service (reservation_id, service_id) VALUES ($1, $2)"
            )
            .bind(id.get())
            .bind(service_id.get())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        }

        tx.commit().await.map_err(query_error)?;

        Ok(Reservation { id, ..reservation })
    }

    async fn update(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(query_error)?;

        let result = sqlx::query(
            "UPDATE reservation
             SET start_date = $2, end_date = $3, booked_at = $4, status = $5, \
             total_amount = $6, room_id = $7, hotel_id = $8
             WHERE id = $1"
        )
        .bind(reservation.id.get())
        .bind(reservation.start_date)
        .bind(reservation.end_date)
        .bind(reservation.booked_at)
        .bind(reservation.status.to_string())
        .bind(reservation.total_amount)
        .bind(reservation.room_id.get())
        .bind(reservation.hotel_id.get())
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "Reservation".to_string(),
                id: reservation.id.to_string()
            });
        }

        sqlx::query("DELETE FROM reservation_service WHERE reservation_id = $1")
            .bind(reservation.id.get())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        for service_id in &reservation.service_ids {
            sqlx::query(
                "INSERT INTO reservation_service (reservation_id, service_id) VALUES ($1, $2)"
            )
            .bind(reservation.id.get())
            .bind(service_id.get())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        }

        tx.commit().await.map_err(query_error)
    }

    async fn find_by_id(&self, id: ReservationId) -> Result<Option<Reservation>, StoreError> {
        let row = sqlx::query(&format!("{RESERVATION_SELECT} WHERE r.id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let services = self.service_ids_for(&[id.get()]).await?;
                let service_ids = services.get(&id.get()).cloned().unwrap_or_default();
                Ok(Some(Self::map_reservation(&row, service_ids)?))
            }
            None => Ok(None)
        }
    }

    async fn delete_by_id(&self, id: ReservationId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM reservation WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "Reservation".to_string(),
                id: id.to_string()
            });
        }
        Ok(())
    }

    async fn find_by_client(&self, client_id: UserId) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query(&format!("{RESERVATION_SELECT} WHERE r.client_id = $1"))
            .bind(client_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        self.collect_reservations(rows).await
    }

    async fn find_by_hotel(&self, hotel_id: HotelId) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query(&format!("{RESERVATION_SELECT} WHERE r.hotel_id = $1"))
            .bind(hotel_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        self.collect_reservations(rows).await
    }

    async fn find_active(
        &self,
        status: ReservationStatus,
        on: NaiveDate
    ) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query(&format!(
            "{RESERVATION_SELECT} WHERE r.status = $1 AND r.start_date <= $2 AND r.end_date >= $2"
        ))
        .bind(status.to_string())
        .bind(on)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;
        self.collect_reservations(rows).await
    }

    async fn search(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query(&format!(
            "{RESERVATION_SELECT}
             WHERE ($1::BIGINT IS NULL OR r.client_id = $1)
               AND ($2::BIGINT IS NULL OR r.hotel_id = $2)
               AND ($3::DATE IS NULL OR r.start_date >= $3)
               AND ($4::DATE IS NULL OR r.end_date <= $4)
               AND ($5::TEXT IS NULL OR UPPER(r.status) = UPPER($5))"
        ))
        .bind(filter.client_id.map(UserId::get))
        .bind(filter.hotel_id.map(HotelId::get))
        .bind(filter.start_after)
        .bind(filter.end_before)
        .bind(filter.status.map(|status| status.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;
        self.collect_reservations(rows).await
    }

    async fn total_amount_by_client(&self, client_id: UserId) -> Result<f64, StoreError> {
        let total: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM reservation WHERE client_id = $1"
        )
        .bind(client_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;
        Ok(total)
    }
}
