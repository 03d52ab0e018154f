//! Seed data for the headless playground

use crate::gateway::Gist;

pub const DEMO_DATABASE: &str = "demo.db";

pub const DEMO_QUERY: &str = "select * from employees\nlimit 10;";

pub const DEMO_SCHEMA: &str = r#"
create table employees (
    id integer primary key,
    name text,
    city text,
    department text,
    salary integer
);
insert into employees (id, name, city, department, salary) values
    (11, 'Diane', 'London', 'hr', 70),
    (12, 'Bob', 'London', 'hr', 78),
    (21, 'Emma', 'Berlin', 'it', 84),
    (22, 'Grace', 'Berlin', 'it', 90),
    (23, 'Henry', 'London', 'it', 104),
    (24, 'Irene', 'Berlin', 'it', 104),
    (25, 'Frank', 'Berlin', 'it', 120),
    (31, 'Cindy', 'Berlin', 'sales', 96),
    (32, 'Dave', 'London', 'sales', 96),
    (33, 'Alice', 'Berlin', 'sales', 100);

create table expenses (
    year integer,
    month integer,
    expense text,
    price integer
);
insert into expenses (year, month, expense, price) values
    (2020, 1, 'office', 300),
    (2020, 1, 'travel', 1200),
    (2020, 2, 'office', 300),
    (2020, 2, 'travel', 800),
    (2020, 3, 'office', 320);
"#;

pub const EMPLOYEES_GIST_ID: &str = "e012594111ce51f91590c4737e41a046";

/// The published employees snippet
pub fn employees_gist() -> Gist {
    let schema = DEMO_SCHEMA
        .split("create table expenses")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    Gist::new(
        EMPLOYEES_GIST_ID,
        "employees.en.db",
        "nalgeon",
        schema,
        "select * from employees order by id;",
    )
}
