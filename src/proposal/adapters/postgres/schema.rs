//! Diesel schema for proposal and run-log persistence.

diesel::table! {
    /// Change proposals with their ordered file edits.
    change_proposals (id) {
        /// Internal proposal identifier.
        id -> Uuid,
        /// Target repository identifier.
        repository_id -> Uuid,
        /// Submitting user; null for unattended runs.
        user_id -> Nullable<Uuid>,
        /// Instruction the proposal answers.
        instruction -> Text,
        /// Step-by-step plan.
        plan -> Text,
        /// Free-text explanation.
        explanation -> Text,
        /// Risk classification.
        #[max_length = 16]
        risk -> Varchar,
        /// Ordered file edits without their derived diffs.
        edits -> Jsonb,
        /// Commit message.
        commit_message -> Text,
        /// Lifecycle state.
        #[max_length = 16]
        status -> Varchar,
        /// Last commit created on application.
        #[max_length = 128]
        commit_id -> Nullable<Varchar>,
        /// Aggregate error of the last failed attempt.
        error_message -> Nullable<Text>,
        /// Optimistic-concurrency revision.
        revision -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit records of pipeline executions.
    automation_run_logs (id) {
        /// Internal run identifier.
        id -> Uuid,
        /// Repository identifier.
        repository_id -> Uuid,
        /// Applied proposal, if any.
        proposal_id -> Nullable<Uuid>,
        /// What started the run.
        #[max_length = 16]
        run_trigger -> Varchar,
        /// Outcome.
        #[max_length = 16]
        status -> Varchar,
        /// Resulting commit, if any.
        #[max_length = 128]
        commit_id -> Nullable<Varchar>,
        /// Commit message.
        commit_message -> Text,
        /// Paths touched by the run.
        files_changed -> Jsonb,
        /// Free-text analysis.
        analysis -> Text,
        /// Failure detail, if any.
        error_detail -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
