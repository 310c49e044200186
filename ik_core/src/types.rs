use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

/// Role assigned to an authenticated user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Role {
    Customer,
    HotelOperator,
    PlatformOperator
}

/// Lifecycle state of a reservation.
///
/// `Pending` is the only mutable state; `Confirmed` and `Cancelled` are
/// terminal. Parsing is case-insensitive so search filters accept
/// "confirmed" as well as "CONFIRMED".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString, Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ReservationId(i64);

impl ReservationId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ReservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReservationId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| anyhow::anyhow!("Invalid reservation ID: {s}"))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct RoomId(i64);

impl RoomId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RoomId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| anyhow::anyhow!("Invalid room ID: {s}"))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct HotelId(i64);

impl HotelId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for HotelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for HotelId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| anyhow::anyhow!("Invalid hotel ID: {s}"))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ServiceId(i64);

impl ServiceId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ServiceId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| anyhow::anyhow!("Invalid service ID: {s}"))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| anyhow::anyhow!("Invalid user ID: {s}"))
    }
}

/// The authenticated caller of a lifecycle operation.
///
/// Built by the presentation layer from the verified identity token and
/// passed explicitly into every call; the core never reads ambient
/// security state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    /// Stable login identifier (email or username).
    pub login: String
}

impl Principal {
    pub fn new(user_id: UserId, role: Role, login: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            login: login.into()
        }
    }
}

/// Denormalized reference to a user embedded in owning records.
///
/// Carried on reservations (the owning customer) and hotels (the
/// operator) so ownership checks need no extra lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRef {
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>
}

impl UserRef {
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            username: None
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Whether `principal` is this user.
    ///
    /// Matches on id, or on the login string against email/username
    /// ignoring ASCII case.
    pub fn matches(&self, principal: &Principal) -> bool {
        if self.id == principal.user_id {
            return true;
        }
        let login = principal.login.as_str();
        self.email.eq_ignore_ascii_case(login)
            || self
                .username
                .as_deref()
                .is_some_and(|u| u.eq_ignore_ascii_case(login))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct Hotel {
    pub id: HotelId,
    pub name: String,
    pub address: String,
    /// Star rating, 1 through 5.
    #[validate(range(min = 1, max = 5))]
    pub stars: u8,
    /// The single hotel-operator user responsible for this hotel.
    pub operator: UserRef
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Room {
    pub id: RoomId,
    pub number: String,
    pub room_type: String,
    pub price: f64,
    /// Availability flag maintained by the hotel operator. Independent of
    /// any reservation calendar.
    pub available: bool,
    pub hotel_id: HotelId
}

/// Optional add-on sold by a hotel (breakfast, spa, parking, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ServiceOffering {
    pub id: ServiceId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// A missing price contributes zero to the reservation total.
    pub price: Option<f64>,
    pub hotel_id: HotelId
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Reservation {
    pub id: ReservationId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Set on creation and refreshed on every successful mutation.
    pub booked_at: DateTime<Utc>,
    pub status: ReservationStatus,
    pub total_amount: f64,
    pub customer: UserRef,
    pub room_id: RoomId,
    /// Always equal to the booked room's hotel.
    pub hotel_id: HotelId,
    pub service_ids: Vec<ServiceId>
}

impl Reservation {
    /// Whether the stay covers `date` (both endpoints inclusive).
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Payload for creating a reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateReservation {
    pub room_id: RoomId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub service_ids: Vec<ServiceId>
}

/// Partial update of a pending reservation. Absent fields are left as-is;
/// a supplied `service_ids` (including an empty list) replaces the prior
/// selection entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReservationUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_ids: Option<Vec<ServiceId>>
}

/// Conjunctive, all-optional reservation search filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReservationFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<HotelId>,
    /// Keep reservations starting on or after this date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_after: Option<NaiveDate>,
    /// Keep reservations ending on or before this date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_before: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReservationStatus>
}

impl ReservationFilter {
    /// Whether `reservation` passes every supplied criterion.
    pub fn accepts(&self, reservation: &Reservation) -> bool {
        self.client_id
            .is_none_or(|id| reservation.customer.id == id)
            && self.hotel_id.is_none_or(|id| reservation.hotel_id == id)
            && self
                .start_after
                .is_none_or(|date| reservation.start_date >= date)
            && self
                .end_before
                .is_none_or(|date| reservation.end_date <= date)
            && self.status.is_none_or(|status| reservation.status == status)
    }
}
