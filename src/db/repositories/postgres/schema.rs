diesel::table! {
    crops (crop_id) {
        crop_id -> Int4,
        crop_name -> Text,
        planting_season -> Nullable<Text>,
        expected_yield_per_acre -> Nullable<Float8>,
    }
}

diesel::table! {
    weather_data (weather_id) {
        weather_id -> Int4,
        record_date -> Date,
        location -> Text,
        temperature_max_celsius -> Nullable<Float8>,
        temperature_min_celsius -> Nullable<Float8>,
        precipitation_mm -> Nullable<Float8>,
        humidity_percentage -> Nullable<Float8>,
        wind_speed_kph -> Nullable<Float8>,
        weather_description -> Nullable<Text>,
    }
}

diesel::table! {
    yields (yield_id) {
        yield_id -> Int4,
        crop_id -> Int4,
        harvest_date -> Date,
        actual_yield -> Float8,
        unit -> Text,
        field_location -> Nullable<Text>,
        notes -> Nullable<Text>,
    }
}

diesel::table! {
    soil_readings (reading_id) {
        reading_id -> Int4,
        crop_id -> Nullable<Int4>,
        reading_date -> Date,
        soil_moisture_percentage -> Nullable<Float8>,
        ph_level -> Nullable<Float8>,
        nitrogen_level_ppm -> Nullable<Float8>,
        phosphorus_level_ppm -> Nullable<Float8>,
        potassium_level_ppm -> Nullable<Float8>,
        notes -> Nullable<Text>,
    }
}

diesel::table! {
    input_usage (input_id) {
        input_id -> Int4,
        crop_id -> Nullable<Int4>,
        usage_date -> Date,
        input_type -> Text,
        input_name -> Text,
        quantity_used -> Float8,
        unit -> Text,
        field_location -> Nullable<Text>,
        notes -> Nullable<Text>,
    }
}

diesel::table! {
    input_costs (cost_id) {
        cost_id -> Int4,
        input_id -> Nullable<Int4>,
        cost_date -> Date,
        item_name -> Text,
        cost_amount -> Float8,
        currency -> Text,
        notes -> Nullable<Text>,
    }
}

diesel::joinable!(yields -> crops (crop_id));
diesel::joinable!(soil_readings -> crops (crop_id));
diesel::joinable!(input_usage -> crops (crop_id));
diesel::joinable!(input_costs -> input_usage (input_id));

diesel::allow_tables_to_appear_in_same_query!(
    crops,
    input_costs,
    input_usage,
    soil_readings,
    weather_data,
    yields,
);
