use alertsmith_codec::AlertRecord;

/// Title marker distinguishing the peak-hours variant of an alert.
pub const VARIANT_MARKER: &str = "(Peak)";

const NAME_BOUNDARY: &[char] = &[' ', ',', '\'', ')'];
const ID_BOUNDARY: &[char] = &[' ', ',', ')'];

/// How a carrier is identified in alert queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarrierKey {
    Name(String),
    Id(String),
}

impl CarrierKey {
    pub fn value(&self) -> &str {
        match self {
            Self::Name(value) | Self::Id(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Duration,
    ErrorRate,
}

impl AlertKind {
    fn accepts(self, name: &str, query: &str) -> bool {
        match self {
            Self::Duration => name.contains("duration") && query.contains("average(duration)"),
            Self::ErrorRate => query.contains("percentage") && query.contains("error"),
        }
    }
}

/// The query filters on `CarrierName = '<carrier_name>'` and the literal is
/// not the prefix of a longer name.
pub fn name_match(record: &AlertRecord, carrier_name: &str) -> bool {
    let pattern = format!("CarrierName = '{}'", carrier_name.replace('\'', "\\'"));
    occurs_bounded(record.nrql_query(), &pattern, NAME_BOUNDARY)
}

/// The title carries `(<carrier_id>)`, or the query filters on
/// `carrierId = <carrier_id>` without continuing into a longer number.
pub fn id_match(record: &AlertRecord, carrier_id: &str) -> bool {
    if carrier_id.is_empty() {
        return false;
    }
    record.name().contains(&format!("({carrier_id})"))
        || occurs_bounded(
            record.nrql_query(),
            &format!("carrierId = {carrier_id}"),
            ID_BOUNDARY,
        )
}

pub fn matches_key(record: &AlertRecord, key: &CarrierKey) -> bool {
    match key {
        CarrierKey::Name(name) => name_match(record, name),
        CarrierKey::Id(id) => id_match(record, id),
    }
}

/// True when some record of `kind` targets the carrier.
///
/// `variant` filters on [`VARIANT_MARKER`] in the title: `Some(true)` keeps
/// only peak alerts, `Some(false)` only regular ones.
pub fn has_alert_of_kind(
    records: &[AlertRecord],
    key: &CarrierKey,
    kind: AlertKind,
    variant: Option<bool>,
) -> bool {
    let marker = VARIANT_MARKER.to_lowercase();
    records.iter().any(|record| {
        let name = record.name().to_lowercase();
        let query = record.nrql_query().to_lowercase();
        kind.accepts(&name, &query)
            && variant.map_or(true, |wanted| name.contains(&marker) == wanted)
            && matches_key(record, key)
    })
}

pub fn alerts_for_carrier<'a>(records: &'a [AlertRecord], key: &CarrierKey) -> Vec<&'a AlertRecord> {
    records.iter().filter(|r| matches_key(r, key)).collect()
}

fn occurs_bounded(haystack: &str, needle: &str, boundary: &[char]) -> bool {
    haystack.match_indices(needle).any(|(at, _)| {
        haystack[at + needle.len()..]
            .chars()
            .next()
            .map_or(true, |next| boundary.contains(&next))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, query: &str) -> AlertRecord {
        AlertRecord::new(name, query)
    }

    #[test]
    fn name_match_stops_at_boundary() {
        let dpd = record("x", "SELECT count(*) FROM Tx WHERE CarrierName = 'DPD'");
        let france = record("x", "SELECT count(*) FROM Tx WHERE CarrierName = 'DPD France'");
        assert!(name_match(&dpd, "DPD"));
        assert!(!name_match(&france, "DPD"));
        assert!(name_match(&france, "DPD France"));
    }

    #[test]
    fn name_match_escapes_quotes() {
        let query = record("x", r"WHERE CarrierName = 'O\'Neil Freight' LIMIT 1");
        assert!(name_match(&query, "O'Neil Freight"));
        assert!(!name_match(&query, "O"));
    }

    #[test]
    fn name_match_checks_every_occurrence() {
        let query = record(
            "x",
            "WHERE CarrierName = 'DPDX' OR CarrierName = 'DPD')",
        );
        assert!(name_match(&query, "DPD"));
    }

    #[test]
    fn id_match_rejects_longer_numbers() {
        let q741 = record("Errors", "SELECT 1 FROM Tx WHERE carrierId = 741");
        assert!(!id_match(&q741, "74"));
        assert!(id_match(&q741, "741"));

        let in_list = record("Errors", "WHERE carrierId = 74, other");
        assert!(id_match(&in_list, "74"));
        let in_parens = record("Errors", "WHERE (carrierId = 74)");
        assert!(id_match(&in_parens, "74"));
    }

    #[test]
    fn id_match_accepts_title_suffix() {
        let titled = record("Shipment duration <DPD>(741)", "SELECT 1");
        assert!(id_match(&titled, "741"));
        assert!(!id_match(&titled, "74"));
        assert!(!id_match(&titled, ""));
    }

    #[test]
    fn kind_and_variant_filters() {
        let records = vec![
            record(
                "Shipment Duration <DPD>(741) (Peak)",
                "SELECT AVERAGE(duration) FROM Tx WHERE carrierId = 741",
            ),
            record(
                "Error rate <GLS>(12)",
                "SELECT percentage(count(*), WHERE error IS true) FROM Tx WHERE carrierId = 12",
            ),
        ];
        let dpd = CarrierKey::Id("741".to_string());
        let gls = CarrierKey::Id("12".to_string());

        assert!(has_alert_of_kind(&records, &dpd, AlertKind::Duration, None));
        assert!(has_alert_of_kind(&records, &dpd, AlertKind::Duration, Some(true)));
        assert!(!has_alert_of_kind(&records, &dpd, AlertKind::Duration, Some(false)));
        assert!(!has_alert_of_kind(&records, &dpd, AlertKind::ErrorRate, None));
        assert!(has_alert_of_kind(&records, &gls, AlertKind::ErrorRate, Some(false)));
        assert!(!has_alert_of_kind(&[], &gls, AlertKind::ErrorRate, None));
    }

    #[test]
    fn alerts_for_carrier_by_name() {
        let records = vec![
            record("a", "WHERE CarrierName = 'UPS'"),
            record("b", "WHERE CarrierName = 'UPS Ground'"),
            record("c", "WHERE CarrierName = 'UPS' AND x"),
        ];
        let found = alerts_for_carrier(&records, &CarrierKey::Name("UPS".to_string()));
        let names: Vec<&str> = found.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
