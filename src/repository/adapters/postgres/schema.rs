//! Diesel schema for repository configuration persistence.

diesel::table! {
    /// Connected repositories and their automation schedule.
    repository_configs (id) {
        /// Internal repository identifier.
        id -> Uuid,
        /// Remote `owner/repo` name.
        #[max_length = 255]
        full_name -> Varchar,
        /// Branch read from and committed to.
        #[max_length = 255]
        default_branch -> Varchar,
        /// Optional repository description.
        description -> Nullable<Text>,
        /// Whether scheduled automation is enabled.
        automation_enabled -> Bool,
        /// Daily fire time in `HH:MM` format.
        #[max_length = 5]
        scheduled_time -> Varchar,
        /// IANA timezone name.
        #[max_length = 64]
        timezone -> Varchar,
        /// Derived cron expression, written for external readers only.
        #[max_length = 32]
        recurrence_rule -> Varchar,
        /// Completion time of the last successful run.
        last_run_at -> Nullable<Timestamptz>,
        /// Optimistic-concurrency revision.
        revision -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
