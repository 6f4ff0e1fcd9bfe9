//! pg_stat_user_functions / pg_stat_xact_user_functions fetcher.

use crate::error::Result;
use crate::handle::QueryHandle;
use crate::nullable::{NullFloat64, NullInt64};

use super::queries::build_stat_functions_query;
use super::{FunctionsView, fetch_rows};

stat_row! {
    /// Call statistics for one tracked function (`track_functions`).
    pub struct FunctionsRow {
        pub funcid: i64,
        pub schemaname: String,
        pub funcname: String,
        pub calls: NullInt64,
        /// Milliseconds, including nested calls.
        pub total_time: NullFloat64,
        pub self_time: NullFloat64,
    }
}

pub fn fetch<H: QueryHandle + ?Sized>(
    handle: &mut H,
    view: FunctionsView,
) -> Result<Vec<FunctionsRow>> {
    fetch_rows(handle, view.relation(), &build_stat_functions_query(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockHandle, MockRow};

    #[test]
    fn reads_function_calls() {
        let row = MockRow::nulls(6)
            .set(0, 16400i64)
            .set(1, "public")
            .set(2, "refresh_totals")
            .set(3, 5i64)
            .set(4, 12.5f64)
            .set(5, 10.0f64);
        let mut handle =
            MockHandle::new("11.3").with_rows("pg_stat_xact_user_functions", vec![row]);
        let rows = fetch(&mut handle, FunctionsView::XactUser).unwrap();
        assert_eq!(rows[0].funcname, "refresh_totals");
        assert_eq!(rows[0].total_time, NullFloat64::new(12.5));
    }

    #[test]
    fn untracked_functions_yield_empty_collection() {
        let mut handle = MockHandle::new("11.3").with_rows("pg_stat_user_functions", vec![]);
        assert!(fetch(&mut handle, FunctionsView::User).unwrap().is_empty());
    }
}
