//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations under `migrations/` exactly.
//! They are used by Diesel for compile-time query validation and type-safe
//! SQL generation. When migrations change the schema, update this file to
//! match (`diesel print-schema` can regenerate it from a live database).

diesel::table! {
    /// User accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Login email, lower-cased, unique.
        email -> Varchar,
        /// Human-readable display name.
        display_name -> Varchar,
        /// Role string: buyer, seller, or admin.
        role -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Varchar,
        /// Premium membership expiry, when one was ever purchased.
        premium_until -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// For-sale business listings.
    listings (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Selling account.
        owner_id -> Uuid,
        /// Headline shown in search results.
        title -> Varchar,
        /// Business category, lower-cased.
        category -> Varchar,
        /// Long-form description.
        description -> Text,
        /// Asking price in minor units.
        asking_price_minor -> Int8,
        /// Average monthly revenue in minor units.
        monthly_revenue_minor -> Int8,
        /// Average monthly profit in minor units.
        monthly_profit_minor -> Int8,
        /// Review status string: pending, approved, or rejected.
        status -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Saved listings, one row per (user, listing) pair.
    favourites (user_id, listing_id) {
        /// Saving account.
        user_id -> Uuid,
        /// Saved listing.
        listing_id -> Uuid,
        /// Instant the pair was saved.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Buyer/seller meeting requests.
    appointments (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Listing the meeting concerns.
        listing_id -> Uuid,
        /// Booking buyer.
        buyer_id -> Uuid,
        /// Requested meeting instant.
        scheduled_at -> Timestamptz,
        /// Optional note from the buyer.
        note -> Nullable<Text>,
        /// Status string: pending, confirmed, or cancelled.
        status -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Listing Q&A.
    questions (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Listing the question concerns.
        listing_id -> Uuid,
        /// Asking account.
        author_id -> Uuid,
        /// Question text.
        body -> Text,
        /// Seller's answer, if given.
        answer -> Nullable<Text>,
        /// Instant the answer was recorded.
        answered_at -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Premium purchase orders.
    membership_orders (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Purchasing account.
        user_id -> Uuid,
        /// Plan identifier.
        plan -> Varchar,
        /// Charge amount in minor units.
        amount_minor -> Int8,
        /// ISO currency code.
        currency -> Varchar,
        /// Unique gateway reference.
        reference -> Varchar,
        /// Settlement status string: pending, paid, or failed.
        status -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(listings -> users (owner_id));
diesel::joinable!(appointments -> listings (listing_id));
diesel::joinable!(favourites -> listings (listing_id));
diesel::joinable!(questions -> listings (listing_id));
diesel::joinable!(membership_orders -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    listings,
    favourites,
    appointments,
    questions,
    membership_orders,
);
