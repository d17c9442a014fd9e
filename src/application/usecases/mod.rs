pub mod broadcast_marketing;
pub mod dispatch_due_wishes;
pub mod get_wish;
pub mod reclaim_stale;
pub mod reconcile_status;
pub mod schedule_wish;
pub mod send_test_message;
pub mod send_wish;
pub mod verify_webhook;
