//! Choosing one dataset out of a catalog listing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogRef, Dataset};

/// How to pick a dataset from a catalog.
///
/// `Latest` never trusts catalog order: it compares the timestamp embedded
/// in each dataset name and only falls back to name order when no name
/// carries a recognizable time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    #[default]
    Latest,
    First,
    Last,
}

impl SelectionPolicy {
    pub fn select<'a>(&self, datasets: &'a [Dataset]) -> Option<&'a Dataset> {
        self.pick(datasets, |d| d.name.as_str())
    }

    /// Same rules applied to sub-catalog links, e.g. dated directories.
    pub fn select_ref<'a>(&self, refs: &'a [CatalogRef]) -> Option<&'a CatalogRef> {
        self.pick(refs, |r| r.name.as_str())
    }

    fn pick<'a, T>(&self, items: &'a [T], name: impl Fn(&T) -> &str) -> Option<&'a T> {
        match self {
            SelectionPolicy::First => items.first(),
            SelectionPolicy::Last => items.last(),
            SelectionPolicy::Latest => latest(items, name),
        }
    }
}

fn latest<T>(items: &[T], name: impl Fn(&T) -> &str) -> Option<&T> {
    let timed = items
        .iter()
        .filter_map(|item| name_timestamp(name(item)).map(|t| (t, item)))
        .max_by(|(ta, a), (tb, b)| ta.cmp(tb).then_with(|| name(*a).cmp(name(*b))));

    match timed {
        Some((_, item)) => Some(item),
        None => items.iter().max_by(|a, b| name(*a).cmp(name(*b))),
    }
}

/// Extract the time a dataset name refers to.
///
/// Recognized forms, tried in order:
/// - GOES start time `_sYYYYJJJHHMMSS`
/// - `YYYYMMDD_HHMM`
/// - `YYYYMMDDTHHMM`
pub fn name_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let bytes = name.as_bytes();
    goes_start_time(bytes)
        .or_else(|| date_sep_time(bytes, b'_'))
        .or_else(|| date_sep_time(bytes, b'T'))
}

fn digits(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn goes_start_time(bytes: &[u8]) -> Option<DateTime<Utc>> {
    const LEN: usize = 2 + 13;
    bytes.windows(LEN).find_map(|w| {
        if &w[..2] != b"_s" {
            return None;
        }
        let year = digits(&w[2..6])? as i32;
        let doy = digits(&w[6..9])?;
        let hour = digits(&w[9..11])?;
        let minute = digits(&w[11..13])?;
        let second = digits(&w[13..15])?;
        let date = NaiveDate::from_yo_opt(year, doy)?;
        let time = NaiveTime::from_hms_opt(hour, minute, second)?;
        Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)))
    })
}

fn date_sep_time(bytes: &[u8], sep: u8) -> Option<DateTime<Utc>> {
    const LEN: usize = 8 + 1 + 4;
    bytes.windows(LEN).enumerate().find_map(|(start, w)| {
        // Reject windows that sit inside a longer digit run.
        if start > 0 && bytes[start - 1].is_ascii_digit() {
            return None;
        }
        if w[8] != sep {
            return None;
        }
        let year = digits(&w[0..4])? as i32;
        let month = digits(&w[4..6])?;
        let day = digits(&w[6..8])?;
        let hour = digits(&w[9..11])?;
        let minute = digits(&w[11..13])?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ds(name: &str) -> Dataset {
        Dataset {
            name: name.to_string(),
            id: None,
            url_path: format!("path/{name}"),
            service_name: None,
        }
    }

    #[test]
    fn test_model_run_timestamp() {
        let t = name_timestamp("RR_CONUS_13km_20240305_1400.grib2").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-03-05T14:00:00+00:00");
    }

    #[test]
    fn test_goes_start_timestamp() {
        let t = name_timestamp(
            "OR_ABI-L2-CMIPC-M6C02_G16_s20240651401170_e20240651403543_c20240651404023.nc",
        )
        .unwrap();
        // Day 65 of 2024 is March 5.
        assert_eq!(t.to_rfc3339(), "2024-03-05T14:01:17+00:00");
    }

    #[test]
    fn test_iso_like_timestamp() {
        let t = name_timestamp("HRRR_20240305T1800.nc").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-03-05T18:00:00+00:00");
    }

    #[test]
    fn test_no_timestamp() {
        assert!(name_timestamp("Best.ncd").is_none());
        assert!(name_timestamp("run_20241399_9999").is_none());
    }

    #[test]
    fn test_latest_ignores_catalog_order() {
        let list = vec![
            ds("RR_CONUS_13km_20240305_1200.grib2"),
            ds("RR_CONUS_13km_20240305_1400.grib2"),
            ds("RR_CONUS_13km_20240305_1300.grib2"),
        ];
        let chosen = SelectionPolicy::Latest.select(&list).unwrap();
        assert_eq!(chosen.name, "RR_CONUS_13km_20240305_1400.grib2");
    }

    #[test]
    fn test_latest_crosses_day_boundary() {
        let list = vec![
            ds("RR_CONUS_13km_20240306_0000.grib2"),
            ds("RR_CONUS_13km_20240305_2300.grib2"),
        ];
        let chosen = SelectionPolicy::Latest.select(&list).unwrap();
        assert_eq!(chosen.name, "RR_CONUS_13km_20240306_0000.grib2");
    }

    #[test]
    fn test_latest_falls_back_to_name_order() {
        let list = vec![ds("b.nc"), ds("c.nc"), ds("a.nc")];
        assert_eq!(SelectionPolicy::Latest.select(&list).unwrap().name, "c.nc");
    }

    #[test]
    fn test_timed_names_win_over_untimed() {
        let list = vec![ds("zz_best.nc"), ds("RR_CONUS_13km_20240305_1200.grib2")];
        assert_eq!(
            SelectionPolicy::Latest.select(&list).unwrap().name,
            "RR_CONUS_13km_20240305_1200.grib2"
        );
    }

    #[test]
    fn test_first_and_last() {
        let list = vec![ds("b.nc"), ds("a.nc")];
        assert_eq!(SelectionPolicy::First.select(&list).unwrap().name, "b.nc");
        assert_eq!(SelectionPolicy::Last.select(&list).unwrap().name, "a.nc");
    }

    #[test]
    fn test_latest_dated_sub_catalog() {
        let refs: Vec<CatalogRef> = ["20240304", "20240305", "20240303"]
            .iter()
            .map(|name| CatalogRef {
                name: name.to_string(),
                href: format!("{name}/catalog.xml"),
            })
            .collect();
        assert_eq!(SelectionPolicy::Latest.select_ref(&refs).unwrap().name, "20240305");
        assert_eq!(SelectionPolicy::First.select_ref(&refs).unwrap().name, "20240304");
    }

    #[test]
    fn test_empty_listing() {
        assert!(SelectionPolicy::Latest.select(&[]).is_none());
    }
}
