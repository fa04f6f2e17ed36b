//! Diesel schema for task assignment persistence.

diesel::table! {
    /// Task records with their current lifecycle status and assignee.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Task title.
        #[max_length = 200]
        title -> Varchar,
        /// Free-form description.
        description -> Text,
        /// Required skill tier.
        #[max_length = 20]
        difficulty -> Varchar,
        /// Optional deadline.
        deadline -> Nullable<Timestamptz>,
        /// Effort estimate in whole hours.
        estimated_hours -> Int4,
        /// Priority from 1 to 5.
        priority -> Int2,
        /// Task lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Creating administrator.
        created_by -> Uuid,
        /// Current assignee.
        assigned_to -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Latest assignment timestamp.
        assigned_at -> Nullable<Timestamptz>,
        /// Latest completion timestamp.
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Historical bindings between tasks and workers.
    assignments (id) {
        /// Internal assignment identifier.
        id -> Uuid,
        /// Assigned task.
        task_id -> Uuid,
        /// Bound worker.
        assignee -> Uuid,
        /// User who made the assignment.
        assigned_by -> Uuid,
        /// Automatic or manual selection.
        #[max_length = 20]
        origin -> Varchar,
        /// Assignment lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Assignment timestamp.
        assigned_at -> Timestamptz,
        /// Start timestamp.
        started_at -> Nullable<Timestamptz>,
        /// Rejection timestamp.
        rejected_at -> Nullable<Timestamptz>,
        /// Worker's reason for declining.
        rejection_reason -> Nullable<Text>,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Approval timestamp.
        approved_at -> Nullable<Timestamptz>,
        /// Approving administrator.
        approved_by -> Nullable<Uuid>,
        /// Cancellation timestamp.
        cancelled_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Completion reports, at most one per assignment.
    reports (id) {
        /// Internal report identifier.
        id -> Uuid,
        /// Reported assignment.
        assignment_id -> Uuid,
        /// Description of the work done.
        report_text -> Text,
        /// Hours spent.
        hours_worked -> Int4,
        /// Problems encountered.
        challenges_faced -> Text,
        /// How the problems were solved.
        solutions_applied -> Text,
        /// Review status.
        #[max_length = 20]
        status -> Varchar,
        /// Submission timestamp.
        submitted_at -> Timestamptz,
        /// Review timestamp.
        reviewed_at -> Nullable<Timestamptz>,
        /// Reviewing administrator.
        reviewed_by -> Nullable<Uuid>,
        /// Reviewer notes.
        review_notes -> Text,
    }
}

diesel::table! {
    /// Worker qualification, capacity, and statistics counters.
    worker_profiles (user_id) {
        /// Worker identity.
        user_id -> Uuid,
        /// Human-readable name.
        #[max_length = 150]
        display_name -> Varchar,
        /// Qualification tier.
        #[max_length = 20]
        skill_tier -> Varchar,
        /// Whether the worker accepts new work.
        is_active_worker -> Bool,
        /// Concurrent assignment cap.
        max_tasks -> Int4,
        /// Assignments received.
        tasks_assigned -> Int8,
        /// Approved completions.
        tasks_completed -> Int8,
        /// Declined assignments.
        tasks_rejected -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(assignments -> tasks (task_id));
diesel::joinable!(reports -> assignments (assignment_id));

diesel::allow_tables_to_appear_in_same_query!(assignments, reports, tasks, worker_profiles);
