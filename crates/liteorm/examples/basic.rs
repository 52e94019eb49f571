//! Basic usage example for liteorm
//!
//! Run with: cargo run --example basic -p liteorm
//!
//! Set LITEORM_DATABASE (and optionally LITEORM_DATABASE_DIR) in .env file
//! or environment variable:
//! LITEORM_DATABASE=example.db

use liteorm::connection;
use liteorm::prelude::*;

#[derive(Debug, Default, Entity)]
struct User {
    #[orm(primary_key, auto_increment)]
    id: i64,
    name: String,
    password: String,
    active: bool,
    #[orm(one_to_many = "userId")]
    things: Related<Thing>,
}

#[derive(Debug, Default, Entity)]
struct Thing {
    #[orm(primary_key, auto_increment)]
    id: i64,
    name: String,
    value: i32,
    #[orm(column = "userId")]
    user_id: i64,
}

fn main() -> Result<(), OrmError> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = ConnectionConfig::from_env().unwrap_or_else(|_| ConnectionConfig::in_memory());
    connection::init(&config)?;

    connection::execute_batch(
        "create table if not exists user (
            id integer primary key autoincrement,
            name text,
            password text,
            active integer
         );
         create table if not exists thing (
            id integer primary key autoincrement,
            name text,
            value integer,
            userId integer
         );
         delete from thing;
         delete from user;",
    )?;

    for issue in connection::check_entities()? {
        println!("schema: {issue}");
    }

    // Insert a user together with its things
    let mut nick = User {
        name: "Nick".to_string(),
        password: "123456".to_string(),
        active: true,
        things: Related::from(vec![
            Thing {
                name: "Thing1".to_string(),
                value: 1,
                ..Default::default()
            },
            Thing {
                name: "Thing2".to_string(),
                value: 5,
                ..Default::default()
            },
        ]),
        ..Default::default()
    };
    insert(&mut nick).execute()?;
    println!("Inserted user id={}", nick.id);

    // Query it back; things load on first access
    let users = select::<User>()
        .where_("name")
        .like("N%")
        .order_by("name")
        .asc()
        .get_list()?;
    for user in &users {
        println!("{} (active: {})", user.name, user.active);
        for thing in user.things.get()? {
            println!("  {} = {}", thing.name, thing.value);
        }
    }

    // Update by primary key
    nick.password = "654321".to_string();
    update(&mut nick).execute()?;

    // Projection with a custom column list
    let rows = select::<Thing>()
        .from(&nick)
        .get_columns(&ColumnExpression::new().column("thing.name").as_("n").column("value"))?;
    for row in rows {
        println!("{}", row.to_json()?);
    }

    println!("{} things", select::<Thing>().get_count()?);

    delete_entity(&nick).execute()?;
    Ok(())
}
