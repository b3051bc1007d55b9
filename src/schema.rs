// Kept in sync by hand with the CREATE TABLE in repository::diesel_business.

diesel::table! {
    businesses (id) {
        id -> Text,
        name -> Text,
        slug -> Text,
        description -> Nullable<Text>,
        category -> Text,
        subcategory -> Nullable<Text>,
        address -> Text,
        address_line2 -> Nullable<Text>,
        postcode -> Nullable<Text>,
        phone -> Nullable<Text>,
        email -> Nullable<Text>,
        website -> Nullable<Text>,
        opening_hours -> Nullable<Text>,
        services -> Nullable<Text>,
        specialties -> Nullable<Text>,
        latitude -> Nullable<Double>,
        longitude -> Nullable<Double>,
        source -> Text,
        source_url -> Nullable<Text>,
        status -> Text,
        created_at -> Text,
    }
}
