//! Event type names published on the bus.

/// A user was invited into an organization (including a new org's admin).
pub const USER_INVITED: &str = "user.invited";

/// A session was finalized into a report.
pub const REPORT_FINALIZED: &str = "report.finalized";

/// A finalized report needs follow-up (not every item approved).
pub const REPORT_FOLLOW_UP_REQUIRED: &str = "report.follow_up_required";

/// A report's follow-up date or notes changed.
pub const REPORT_FOLLOW_UP_UPDATED: &str = "report.follow_up_updated";

/// A report's follow-up was marked resolved.
pub const REPORT_FOLLOW_UP_RESOLVED: &str = "report.follow_up_resolved";
