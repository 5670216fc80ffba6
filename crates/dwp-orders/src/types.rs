use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Opaque order handle issued by the platform.
///
/// Platforms hand out integer or string ids. Equality, ordering and display
/// use the decimal/text form, so `10` and `"10"` name the same order; the
/// JSON form it was read in is kept and written back unchanged.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "RawOrderId", into = "RawOrderId")]
pub struct OrderId {
    text: String,
    numeric: bool,
}

impl OrderId {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self {
            text: s.into(),
            numeric: false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when the id was issued (or read) as a JSON number.
    pub fn is_numeric(&self) -> bool {
        self.numeric
    }
}

impl PartialEq for OrderId {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for OrderId {}

impl std::hash::Hash for OrderId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl PartialOrd for OrderId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.text.cmp(&other.text)
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<u64> for OrderId {
    fn from(n: u64) -> Self {
        Self {
            text: n.to_string(),
            numeric: true,
        }
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.text
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawOrderId {
    Num(u64),
    Text(String),
}

impl From<RawOrderId> for OrderId {
    fn from(raw: RawOrderId) -> Self {
        match raw {
            RawOrderId::Num(n) => OrderId::from(n),
            RawOrderId::Text(s) => OrderId::new(s),
        }
    }
}

impl From<OrderId> for RawOrderId {
    fn from(id: OrderId) -> Self {
        match id.text.parse::<u64>() {
            Ok(n) if id.numeric => RawOrderId::Num(n),
            _ => RawOrderId::Text(id.text),
        }
    }
}

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Order lifecycle status as named by the platform.
///
/// Only `pending` and `processing` matter to the promoter and are matched
/// case-insensitively. Every other status is carried verbatim in `Other`;
/// two `Other` values are equal when they differ only in ASCII case.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Processing,
    Other(String),
}

impl OrderStatus {
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        if t.eq_ignore_ascii_case("pending") {
            OrderStatus::Pending
        } else if t.eq_ignore_ascii_case("processing") {
            OrderStatus::Processing
        } else {
            OrderStatus::Other(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Other(s) => s.as_str(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    fn key(&self) -> String {
        self.as_str().trim().to_ascii_lowercase()
    }
}

impl PartialEq for OrderStatus {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (OrderStatus::Pending, OrderStatus::Pending) => true,
            (OrderStatus::Processing, OrderStatus::Processing) => true,
            (OrderStatus::Other(a), OrderStatus::Other(b)) => {
                a.trim().eq_ignore_ascii_case(b.trim())
            }
            _ => false,
        }
    }
}

impl Eq for OrderStatus {}

impl std::hash::Hash for OrderStatus {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        OrderStatus::parse(&s)
    }
}

impl From<OrderStatus> for String {
    fn from(st: OrderStatus) -> Self {
        st.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// OrderRecord
// ---------------------------------------------------------------------------

/// One order as held by the bundled stores (and as written in order files).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub status: OrderStatus,
    /// Raw delivery-date metadata, e.g. `"mardi 14 mars 2024"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
    /// Raw time-slot metadata, e.g. `"09:00 - 09:30"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<String>,
}

impl OrderRecord {
    pub fn pending(
        id: impl Into<OrderId>,
        delivery_date: Option<&str>,
        time_slot: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            status: OrderStatus::Pending,
            delivery_date: delivery_date.map(str::to_string),
            time_slot: time_slot.map(str::to_string),
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_keeps_its_json_form() {
        let ids: Vec<OrderId> = serde_json::from_str(r#"[1042, "A-17", "77"]"#).unwrap();
        assert_eq!(ids, vec![OrderId::from(1042u64), OrderId::from("A-17"), OrderId::from(77u64)]);
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"[1042,"A-17","77"]"#);
    }

    #[test]
    fn status_parses_case_insensitively_and_keeps_spelling() {
        assert_eq!(OrderStatus::parse("Pending"), OrderStatus::Pending);
        assert_eq!(OrderStatus::parse(" processing "), OrderStatus::Processing);

        let on_hold = OrderStatus::parse("On-Hold");
        assert_eq!(on_hold, OrderStatus::Other("on-hold".to_string()));
        assert_eq!(on_hold.as_str(), "On-Hold");
        assert_eq!(serde_json::to_string(&on_hold).unwrap(), r#""On-Hold""#);
    }

    #[test]
    fn record_without_metadata_round_trips_as_absent() {
        let r: OrderRecord = serde_json::from_str(r#"{"id": 7, "status": "pending"}"#).unwrap();
        assert_eq!(r, OrderRecord::pending(7u64, None, None));
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("delivery_date"));
    }
}
