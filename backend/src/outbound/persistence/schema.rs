//! Diesel table definitions for the portal schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Portal accounts with their role and subscription window.
    users (id) {
        id -> Uuid,
        username -> Text,
        /// Lower-cased at write time so uniqueness is case-insensitive.
        email -> Text,
        phone -> Nullable<Text>,
        /// bcrypt hash; never selected by identity reads.
        password_hash -> Text,
        role -> Text,
        plan_type -> Text,
        trial_end -> Nullable<Timestamptz>,
        expiry_date -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Equipment listings offered by owners.
    equipment (id) {
        id -> Uuid,
        owner_id -> Uuid,
        name -> Text,
        description -> Text,
        price_per_day_cents -> Int8,
        image -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Rental requests priced at creation time.
    rentals (id) {
        id -> Uuid,
        equipment_id -> Uuid,
        farmer_id -> Uuid,
        owner_id -> Uuid,
        start_date -> Timestamptz,
        end_date -> Timestamptz,
        duration_days -> Int8,
        total_cost_cents -> Int8,
        status -> Text,
        customer_email -> Text,
        customer_address -> Text,
        rental_purpose -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    livestock (id) {
        id -> Uuid,
        user_id -> Uuid,
        name -> Text,
        livestock_type -> Text,
        region -> Text,
        breed -> Text,
        dob -> Date,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    livestock_logs (id) {
        id -> Uuid,
        livestock_id -> Uuid,
        log_date -> Date,
        feed -> Nullable<Text>,
        production -> Nullable<Float8>,
        symptoms -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// STK push attempts keyed by the gateway checkout reference.
    payment_attempts (id) {
        id -> Uuid,
        checkout_request_id -> Text,
        merchant_request_id -> Text,
        user_id -> Nullable<Uuid>,
        phone -> Text,
        plan -> Text,
        amount_cents -> Int8,
        state -> Text,
        result_code -> Nullable<Int4>,
        result_description -> Nullable<Text>,
        created_at -> Timestamptz,
        resolved_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(equipment -> users (owner_id));
diesel::joinable!(rentals -> equipment (equipment_id));
diesel::joinable!(livestock -> users (user_id));
diesel::joinable!(livestock_logs -> livestock (livestock_id));
diesel::joinable!(payment_attempts -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    equipment,
    rentals,
    livestock,
    livestock_logs,
    payment_attempts,
);
