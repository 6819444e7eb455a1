//! Diesel table definitions for the warehouse. Kept in lockstep with the
//! embedded migrations.

diesel::table! {
    sync_watermarks (entity, scope) {
        entity -> Text,
        scope -> Text,
        last_updated -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    clients (client_id) {
        client_id -> Text,
        version -> Int8,
        first_name -> Text,
        last_name -> Text,
        mobile -> Text,
        linked_client_mobile -> Text,
        land_line -> Text,
        email -> Text,
        street_address_1 -> Text,
        street_address_2 -> Text,
        city -> Text,
        state -> Text,
        postal_code -> Text,
        country -> Text,
        birth_date -> Nullable<Date>,
        client_since -> Nullable<Date>,
        gender -> Text,
        notes -> Text,
        sms_marketing_consent -> Bool,
        email_marketing_consent -> Bool,
        sms_reminder_consent -> Bool,
        email_reminder_consent -> Bool,
        preferred_staff_id -> Text,
        external_id -> Text,
        creating_branch_id -> Text,
        archived -> Bool,
        banned -> Bool,
        deleted -> Bool,
        merged_to_client_id -> Text,
        client_category_ids -> Text,
        first_visit -> Nullable<Timestamptz>,
        last_visit -> Nullable<Timestamptz>,
        photo_url -> Text,
        loyalty_card_serial -> Text,
        loyalty_points -> Nullable<Numeric>,
        credit_outstanding_balance -> Nullable<Numeric>,
        credit_days -> Nullable<Int8>,
        credit_limit -> Nullable<Numeric>,
        created_at_upstream -> Nullable<Timestamptz>,
        updated_at_upstream -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    appointments (branch_id, appointment_id) {
        branch_id -> Text,
        appointment_id -> Text,
        version -> Int8,
        appointment_date -> Date,
        start_time -> Text,
        end_time -> Text,
        price -> Numeric,
        deposit_amount -> Nullable<Numeric>,
        deposit_datetime -> Nullable<Timestamptz>,
        staff_id -> Text,
        confirmed -> Bool,
        service_id -> Text,
        service_name -> Text,
        service_reward_id -> Text,
        staff_request -> Bool,
        preferred_staff -> Bool,
        client_id -> Text,
        purchasing_branch_id -> Text,
        state -> Text,
        activation_state -> Text,
        booking_id -> Text,
        source -> Text,
        deleted -> Bool,
        online_service_categories -> Text,
        created_at_upstream -> Nullable<Timestamptz>,
        updated_at_upstream -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    work_breaks (branch_id, break_id) {
        branch_id -> Text,
        break_id -> Text,
        version -> Int8,
        break_date -> Date,
        start_time -> Text,
        end_time -> Text,
        staff_id -> Text,
        room_id -> Nullable<Text>,
        machine_id -> Nullable<Text>,
        label -> Nullable<Text>,
        paid_break -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    staff_worktimetable_slots (id) {
        id -> Int8,
        branch_id -> Text,
        staff_id -> Text,
        slot_date -> Date,
        start_time -> Text,
        end_time -> Text,
        time_off_start_time -> Nullable<Text>,
        time_off_end_time -> Nullable<Text>,
        slot_type -> Text,
        custom -> Nullable<Text>,
        slot_branch_id -> Nullable<Text>,
        work_activity_id -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    reviews (review_id) {
        review_id -> Text,
        version -> Int8,
        branch_id -> Text,
        client_id -> Text,
        staff_id -> Text,
        rating -> Int4,
        text -> Text,
        published -> Bool,
        reviewed_at -> Nullable<Timestamptz>,
        created_at_upstream -> Nullable<Timestamptz>,
        updated_at_upstream -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    staff (branch_id, staff_id) {
        branch_id -> Text,
        staff_id -> Text,
        version -> Int8,
        first_name -> Text,
        last_name -> Text,
        email -> Text,
        mobile -> Text,
        staff_category_id -> Text,
        self_employed -> Bool,
        hide_from_online_bookings -> Bool,
        archived -> Bool,
        created_at_upstream -> Nullable<Timestamptz>,
        updated_at_upstream -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    products (branch_id, product_id) {
        branch_id -> Text,
        product_id -> Text,
        version -> Int8,
        barcode -> Text,
        name -> Text,
        brand -> Text,
        category_id -> Text,
        price -> Numeric,
        special_price -> Nullable<Numeric>,
        stock_quantity -> Nullable<Int4>,
        archived -> Bool,
        created_at_upstream -> Nullable<Timestamptz>,
        updated_at_upstream -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    stock_virtual_transfers (transaction_item_id) {
        transaction_item_id -> Text,
        processed_at -> Timestamptz,
        from_branch_id -> Text,
        to_branch_id -> Text,
        barcode -> Text,
        quantity -> Int4,
    }
}

diesel::table! {
    stock_virtual_transfer_exceptions (transaction_item_id) {
        transaction_item_id -> Text,
        reason -> Text,
        purchased_at -> Nullable<Timestamptz>,
        product_barcode -> Nullable<Text>,
        product_name -> Nullable<Text>,
        staff_id -> Text,
        staff_first_name -> Nullable<Text>,
        staff_last_name -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}
