//! Report routes.
//!
//! ```text
//! POST   /report/create                        create_report_file
//! GET    /report                               list_reports
//! POST   /report                               save_report
//! PUT    /report                               update_report
//! GET    /report/{id}                          get_report
//! DELETE /report/{id}                          delete_report
//! GET    /report/file/{report_id}/{file_id}    get_report_file
//! DELETE /report/file/{report_id}/{file_id}    delete_report_file
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/report/create", post(reports::create_report_file))
        .route(
            "/report",
            get(reports::list_reports)
                .post(reports::save_report)
                .put(reports::update_report),
        )
        .route(
            "/report/{id}",
            get(reports::get_report).delete(reports::delete_report),
        )
        .route(
            "/report/file/{report_id}/{file_id}",
            get(reports::get_report_file).delete(reports::delete_report_file),
        )
}
