//! Diesel ORM models for the businesses table.

use diesel::prelude::*;

use crate::schema;

/// Business row from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::businesses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BusinessRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub address: String,
    pub address_line2: Option<String>,
    pub postcode: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// JSON object of day -> hours.
    pub opening_hours: Option<String>,
    /// JSON array.
    pub services: Option<String>,
    /// JSON array.
    pub specialties: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: String,
    pub source_url: Option<String>,
    pub status: String,
    pub created_at: String,
}

/// New business for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::businesses)]
pub struct NewBusiness<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub category: &'a str,
    pub subcategory: Option<&'a str>,
    pub address: &'a str,
    pub address_line2: Option<&'a str>,
    pub postcode: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub website: Option<&'a str>,
    pub opening_hours: Option<&'a str>,
    pub services: Option<&'a str>,
    pub specialties: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: &'a str,
    pub source_url: Option<&'a str>,
    pub status: &'a str,
    pub created_at: &'a str,
}
