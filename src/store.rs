use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::{Booking, Department};

#[derive(Debug)]
pub enum StoreError {
    NotFound(Ulid),
    /// A server-side constraint rejected the write.
    Constraint(&'static str),
    /// Transport or backend failure; the operation may be retried by the user.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "not found: {id}"),
            StoreError::Constraint(msg) => write!(f, "constraint violated: {msg}"),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Create shape at the store boundary; the store assigns the id.
#[derive(Debug, Clone)]
pub struct InsertBooking {
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Ulid,
    pub department_id: Option<Ulid>,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    pub is_company_wide: bool,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateBooking {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_at: Option<DateTime<FixedOffset>>,
    pub end_at: Option<DateTime<FixedOffset>>,
}

/// Contract the engine expects from the hosted backend. Schema enforcement
/// and row-level security live behind this boundary; the engine only relies
/// on filtered reads, counted overlap queries, and writes that reject
/// inverted ranges.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get(&self, id: Ulid) -> Result<Booking, StoreError>;

    /// Bookings whose start falls in `[from, to)`, ascending by start.
    async fn bookings_between(
        &self,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Count of bookings overlapping `[start, end)` under half-open
    /// semantics (`start_at < end AND end_at > start`), optionally excluding
    /// one id (the booking being edited).
    async fn count_overlapping(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        exclude: Option<Ulid>,
    ) -> Result<u64, StoreError>;

    async fn insert(&self, booking: InsertBooking) -> Result<Booking, StoreError>;

    async fn update(&self, id: Ulid, changes: UpdateBooking) -> Result<Booking, StoreError>;

    async fn delete(&self, id: Ulid) -> Result<(), StoreError>;

    async fn departments(&self) -> Result<Vec<Department>, StoreError>;
}

/// Reference implementation backed by process memory, used by the test
/// suite and for embedding without a hosted backend. Enforces the same
/// constraints the backend enforces server-side.
pub struct MemoryStore {
    bookings: DashMap<Ulid, Booking>,
    departments: DashMap<Ulid, Department>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            bookings: DashMap::new(),
            departments: DashMap::new(),
        }
    }

    pub fn seed_department(&self, department: Department) {
        self.departments.insert(department.id, department);
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }
}

fn validate_write(
    title: Option<&str>,
    start_at: DateTime<FixedOffset>,
    end_at: DateTime<FixedOffset>,
) -> Result<(), StoreError> {
    if end_at <= start_at {
        return Err(StoreError::Constraint("end_at must be after start_at"));
    }
    if let Some(title) = title
        && title.trim().is_empty() {
            return Err(StoreError::Constraint("title must not be empty"));
        }
    Ok(())
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn get(&self, id: Ulid) -> Result<Booking, StoreError> {
        self.bookings
            .get(&id)
            .map(|e| e.value().clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn bookings_between(
        &self,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Vec<Booking>, StoreError> {
        let mut out: Vec<Booking> = self
            .bookings
            .iter()
            .map(|e| e.value().clone())
            .filter(|b| b.start_at >= from && b.start_at < to)
            .collect();
        out.sort_by_key(|b| b.start_at);
        Ok(out)
    }

    async fn count_overlapping(
        &self,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        exclude: Option<Ulid>,
    ) -> Result<u64, StoreError> {
        let count = self
            .bookings
            .iter()
            .filter(|e| {
                let b = e.value();
                exclude != Some(b.id) && b.start_at < end && b.end_at > start
            })
            .count();
        Ok(count as u64)
    }

    async fn insert(&self, booking: InsertBooking) -> Result<Booking, StoreError> {
        validate_write(Some(&booking.title), booking.start_at, booking.end_at)?;
        let stored = Booking {
            id: Ulid::new(),
            title: booking.title,
            owner_id: booking.owner_id,
            department_id: booking.department_id,
            start_at: booking.start_at,
            end_at: booking.end_at,
            description: booking.description,
            is_company_wide: booking.is_company_wide,
        };
        self.bookings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: Ulid, changes: UpdateBooking) -> Result<Booking, StoreError> {
        let mut entry = self.bookings.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let booking = entry.value_mut();
        let start_at = changes.start_at.unwrap_or(booking.start_at);
        let end_at = changes.end_at.unwrap_or(booking.end_at);
        validate_write(changes.title.as_deref(), start_at, end_at)?;
        if let Some(title) = changes.title {
            booking.title = title;
        }
        if let Some(description) = changes.description {
            booking.description = Some(description);
        }
        booking.start_at = start_at;
        booking.end_at = end_at;
        Ok(booking.clone())
    }

    async fn delete(&self, id: Ulid) -> Result<(), StoreError> {
        self.bookings
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn departments(&self) -> Result<Vec<Department>, StoreError> {
        let mut out: Vec<Department> =
            self.departments.iter().map(|e| e.value().clone()).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::NaiveDate;

    fn ts(day: u32, minutes: i32) -> DateTime<FixedOffset> {
        let date = NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        Config::default().local_datetime(date, minutes).unwrap()
    }

    fn insert_shape(day: u32, start: i32, end: i32) -> InsertBooking {
        InsertBooking {
            title: "standup".into(),
            description: None,
            owner_id: Ulid::new(),
            department_id: None,
            start_at: ts(day, start),
            end_at: ts(day, end),
            is_company_wide: false,
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_stores() {
        let store = MemoryStore::new();
        let booking = store.insert(insert_shape(1, 540, 600)).await.unwrap();
        assert_eq!(store.booking_count(), 1);
        let fetched = store.get(booking.id).await.unwrap();
        assert_eq!(fetched, booking);
    }

    #[tokio::test]
    async fn insert_rejects_inverted_range() {
        let store = MemoryStore::new();
        let result = store.insert(insert_shape(1, 600, 600)).await;
        assert!(matches!(result, Err(StoreError::Constraint(_))));
        let result = store.insert(insert_shape(1, 600, 540)).await;
        assert!(matches!(result, Err(StoreError::Constraint(_))));
        assert_eq!(store.booking_count(), 0);
    }

    #[tokio::test]
    async fn insert_rejects_blank_title() {
        let store = MemoryStore::new();
        let mut shape = insert_shape(1, 540, 600);
        shape.title = "   ".into();
        assert!(matches!(
            store.insert(shape).await,
            Err(StoreError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn count_overlapping_uses_half_open_semantics() {
        let store = MemoryStore::new();
        store.insert(insert_shape(1, 540, 600)).await.unwrap(); // 09:00-10:00

        // Touching boundary: not a conflict.
        let n = store
            .count_overlapping(ts(1, 600), ts(1, 660), None)
            .await
            .unwrap();
        assert_eq!(n, 0);

        // One-minute overlap counts.
        let n = store
            .count_overlapping(ts(1, 599), ts(1, 660), None)
            .await
            .unwrap();
        assert_eq!(n, 1);

        // Different date, same times: nothing.
        let n = store
            .count_overlapping(ts(2, 540), ts(2, 600), None)
            .await
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn count_overlapping_excludes_given_id() {
        let store = MemoryStore::new();
        let booking = store.insert(insert_shape(1, 540, 600)).await.unwrap();
        let n = store
            .count_overlapping(ts(1, 540), ts(1, 600), Some(booking.id))
            .await
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn bookings_between_filters_and_sorts() {
        let store = MemoryStore::new();
        store.insert(insert_shape(2, 840, 900)).await.unwrap();
        store.insert(insert_shape(1, 600, 660)).await.unwrap();
        store.insert(insert_shape(1, 540, 600)).await.unwrap();
        store.insert(insert_shape(9, 540, 600)).await.unwrap(); // outside range

        let list = store.bookings_between(ts(1, 0), ts(3, 0)).await.unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.windows(2).all(|w| w[0].start_at <= w[1].start_at));
    }

    #[tokio::test]
    async fn update_patches_and_revalidates() {
        let store = MemoryStore::new();
        let booking = store.insert(insert_shape(1, 540, 600)).await.unwrap();

        let updated = store
            .update(
                booking.id,
                UpdateBooking {
                    title: Some("retro".into()),
                    start_at: Some(ts(1, 780)),
                    end_at: Some(ts(1, 840)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "retro");
        assert_eq!(updated.start_at, ts(1, 780));

        // Inverted result is rejected and the record untouched.
        let result = store
            .update(
                booking.id,
                UpdateBooking {
                    end_at: Some(ts(1, 700)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::Constraint(_))));
        assert_eq!(store.get(booking.id).await.unwrap().end_at, ts(1, 840));
    }

    #[tokio::test]
    async fn update_and_delete_missing_are_not_found() {
        let store = MemoryStore::new();
        let id = Ulid::new();
        assert!(matches!(
            store.update(id, UpdateBooking::default()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete(id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn departments_listed_by_name() {
        let store = MemoryStore::new();
        store.seed_department(Department {
            id: Ulid::new(),
            name: "Sales".into(),
            default_color: "2563eb".into(),
        });
        store.seed_department(Department {
            id: Ulid::new(),
            name: "Engineering".into(),
            default_color: "16a34a".into(),
        });
        let names: Vec<String> = store
            .departments()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Engineering", "Sales"]);
    }
}
