use crate::{
    Entity, JoinType, OrmError, Related, Value, delete, delete_entity, insert, select, update,
};

#[derive(Debug, Default, Entity)]
struct User {
    #[orm(primary_key, auto_increment)]
    id: i64,
    name: String,
    password: String,
    #[orm(one_to_many = "userId")]
    things: Related<Thing>,
}

#[derive(Debug, Default, Clone, Entity)]
struct Thing {
    #[orm(primary_key, auto_increment)]
    id: i64,
    name: String,
    #[orm(column = "userId")]
    user_id: i64,
}

#[derive(Debug, Default, Entity)]
struct UserAccessGroup {
    #[orm(primary_key, auto_increment)]
    id: i64,
    #[orm(column = "userId")]
    user_id: i64,
    #[orm(column = "groupId")]
    group_id: i64,
}

#[derive(Debug, Default, Entity)]
struct AccessGroup {
    #[orm(primary_key, auto_increment)]
    id: i64,
    name: String,
}

#[derive(Debug, Default, Entity)]
struct BadUser {
    name: String,
}

#[derive(Debug, Default, Entity)]
struct Marker {
    #[orm(primary_key, auto_increment)]
    id: i64,
}

#[derive(Debug, Default, Entity)]
struct Flagged {
    #[orm(primary_key, auto_increment)]
    id: i64,
    #[orm(getter = "get_active")]
    active: bool,
}

impl Flagged {
    fn get_active(&self) -> bool {
        self.active
    }
}

fn nick() -> User {
    User {
        id: 1,
        name: "Nick".into(),
        password: "123456".into(),
        ..Default::default()
    }
}

fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

#[test]
fn select_with_where() {
    let sql = select::<User>().where_("name").eq("Nick").to_sql().unwrap();
    assert_eq!(sql, "select user.* from user where user.name = ?;");
}

#[test]
fn select_with_and() {
    let exec = select::<User>()
        .where_("name")
        .eq("Nick")
        .and("password")
        .eq("123456");
    assert_eq!(
        exec.to_sql().unwrap(),
        "select user.* from user where user.name = ? and user.password = ?;"
    );
    assert_eq!(
        exec.values(),
        [Value::Text("Nick".into()), Value::Text("123456".into())]
    );
}

#[test]
fn select_with_or_and_comparators() {
    let exec = select::<Thing>()
        .where_("id")
        .greater_than(1)
        .or("id")
        .less_than_or_eq(10)
        .and("userId")
        .greater_than_or_eq(2)
        .and("userId")
        .less_than(5);
    assert_eq!(
        exec.to_sql().unwrap(),
        "select thing.* from thing where thing.id > ? or thing.id <= ? and thing.userId >= ? and thing.userId < ?;"
    );
    assert_eq!(exec.values().len(), 4);
}

#[test]
fn like_with_order_by() {
    let base = || {
        select::<User>()
            .where_("name")
            .like("%Ni%")
            .and("password")
            .eq("123456")
            .order_by("name")
    };
    assert_eq!(
        base().asc().to_sql().unwrap(),
        "select user.* from user where user.name like ? and user.password = ? order by name asc;"
    );
    assert_eq!(
        base().desc().to_sql().unwrap(),
        "select user.* from user where user.name like ? and user.password = ? order by name desc;"
    );
}

#[test]
fn update_sets_every_other_column() {
    let mut user = nick();
    let exec = update(&mut user).where_("id").eq(1i64);
    assert_eq!(
        exec.to_sql().unwrap(),
        "update user set name = ?, password = ? where user.id = ?;"
    );
    assert_eq!(
        exec.values(),
        [
            Value::Text("Nick".into()),
            Value::Text("123456".into()),
            Value::Long(1)
        ]
    );
}

#[test]
fn update_infers_primary_key_where() {
    let mut user = nick();
    let (sql, values) = update(&mut user).build().unwrap();
    assert_eq!(sql, "update user set name = ?, password = ? where user.id = ?;");
    assert_eq!(values.last(), Some(&Value::Long(1)));
}

#[test]
fn update_without_primary_key_is_a_configuration_error() {
    let mut bad = BadUser { name: "x".into() };
    let err = update(&mut bad).build().unwrap_err();
    assert!(err.is_configuration(), "{err}");
}

#[test]
fn update_with_nothing_to_set() {
    let mut marker = Marker { id: 3 };
    let err = update(&mut marker).build().unwrap_err();
    assert!(matches!(err, OrmError::Statement(_)));
}

#[test]
fn insert_skips_auto_increment_and_relationships() {
    let mut user = nick();
    user.things.set(vec![Thing::default()]);
    let exec = insert(&mut user);
    assert_eq!(
        exec.to_sql().unwrap(),
        "insert into user(name, password) values(?, ?);"
    );
    assert_eq!(exec.values().len(), 2);
}

#[test]
fn insert_without_columns_uses_default_values() {
    let mut marker = Marker::default();
    assert_eq!(
        insert(&mut marker).to_sql().unwrap(),
        "insert into marker default values;"
    );
}

#[test]
fn bool_column_with_get_accessor_is_a_mapping_error() {
    let mut flagged = Flagged {
        id: 0,
        active: true,
    };
    assert!(flagged.get_active());
    let err = insert(&mut flagged).build().unwrap_err();
    assert!(err.is_mapping(), "{err}");

    let mut flagged = Flagged { id: 4, active: false };
    let err = update(&mut flagged).build().unwrap_err();
    assert!(err.is_mapping(), "{err}");
}

#[test]
fn delete_with_where() {
    let sql = delete::<User>().where_("name").eq("Nick").to_sql().unwrap();
    assert_eq!(sql, "delete from user where user.name = ?;");
}

#[test]
fn delete_entity_infers_primary_key_where() {
    let user = nick();
    let (sql, values) = delete_entity(&user).build().unwrap();
    assert_eq!(sql, "delete from user where user.id = ?;");
    assert_eq!(values, [Value::Long(1)]);
}

#[test]
fn delete_without_instance_or_where_fails() {
    let err = delete::<User>().build().unwrap_err();
    assert!(err.is_configuration(), "{err}");
}

#[test]
fn join_on_another_entity() {
    let sql = select::<User>()
        .join::<User, UserAccessGroup>("id", "userId")
        .where_on::<UserAccessGroup>("userId")
        .eq(1)
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "select user.* from user join useraccessgroup on useraccessgroup.userId = user.id where useraccessgroup.userId = ?;"
    );
}

#[test]
fn joins_concatenate_in_call_order() {
    let sql = select::<User>()
        .join::<User, UserAccessGroup>("id", "userId")
        .join_with::<UserAccessGroup, AccessGroup>("groupId", "id", JoinType::Inner)
        .where_on::<AccessGroup>("id")
        .eq(5)
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "select user.* from user join useraccessgroup on useraccessgroup.userId = user.id inner join accessgroup on accessgroup.id = useraccessgroup.groupId where accessgroup.id = ?;"
    );
}

#[test]
fn from_derives_join_from_relationship() {
    let user = nick();
    assert_eq!(
        select::<Thing>().from(&user).to_sql().unwrap(),
        "select thing.* from thing join user on user.id = thing.userId;"
    );
    assert_eq!(
        select::<Thing>()
            .from(&user)
            .where_("name")
            .eq("blah")
            .to_sql()
            .unwrap(),
        "select thing.* from thing join user on user.id = thing.userId where thing.name = ?;"
    );
}

#[test]
fn to_sql_keeps_the_build_error_kind() {
    let mut flagged = Flagged {
        id: 0,
        active: true,
    };
    let err = insert(&mut flagged).to_sql().unwrap_err();
    assert!(err.is_mapping(), "{err}");

    let err = select::<AccessGroup>()
        .from(&BadUser::default())
        .to_sql()
        .unwrap_err();
    assert!(err.is_configuration(), "{err}");

    let err = select::<AccessGroup>().from(&nick()).to_sql().unwrap_err();
    assert!(err.is_relationship(), "{err}");

    let err = select::<User>().and("name").eq("x").to_sql().unwrap_err();
    assert!(matches!(err, OrmError::Statement(_)));
}

#[test]
fn from_reports_which_side_failed() {
    let err = select::<AccessGroup>()
        .from(&BadUser::default())
        .build()
        .unwrap_err();
    assert!(err.is_configuration(), "{err}");

    let err = select::<AccessGroup>().from(&nick()).build().unwrap_err();
    assert!(err.is_relationship(), "{err}");
    assert!(err.to_string().contains("AccessGroup"));

    let err = select::<AccessGroup>()
        .from(&Thing::default())
        .build()
        .unwrap_err();
    assert!(err.is_relationship(), "{err}");
    assert!(err.to_string().contains("no one-to-many"));
}

#[test]
fn and_without_where_is_reported() {
    let err = select::<User>().and("name").eq("x").build().unwrap_err();
    assert!(matches!(err, OrmError::Statement(_)));
}

#[test]
fn second_where_is_reported() {
    let err = select::<User>()
        .where_("name")
        .eq("x")
        .where_("password")
        .eq("y")
        .build()
        .unwrap_err();
    assert!(matches!(err, OrmError::Statement(_)));
}

#[test]
fn direction_without_order_by_is_reported() {
    assert!(select::<User>().asc().build().is_err());
}

#[test]
fn placeholders_match_bind_values() {
    let mut user = nick();
    let statements = vec![
        select::<User>().where_("name").eq("a").or("name").like("b%").build(),
        update(&mut user).where_("name").eq("Nick").build(),
        delete::<Thing>()
            .where_("userId")
            .eq(1)
            .and("name")
            .eq("x")
            .build(),
    ];
    for built in statements {
        let (sql, values) = built.unwrap();
        assert_eq!(placeholders(&sql), values.len(), "{sql}");
    }

    let mut thing = Thing::default();
    let (sql, values) = insert(&mut thing).build().unwrap();
    assert_eq!(placeholders(&sql), values.len(), "{sql}");
}

#[test]
fn wrong_terminal_for_statement_kind() {
    let err = select::<User>().execute().unwrap_err();
    assert!(matches!(err, OrmError::Statement(_)));

    let mut user = nick();
    let err = insert(&mut user).get_list().unwrap_err();
    assert!(matches!(err, OrmError::Statement(_)));
}

#[test]
fn descriptor_from_derive() {
    let desc = User::descriptor();
    assert_eq!(desc.table, "user");
    assert_eq!(desc.primary_key().map(|c| c.name), Some("id"));
    assert_eq!(desc.relationships.len(), 1);
    assert_eq!(desc.relationships[0].foreign_key, "userId");
    assert_eq!((desc.relationships[0].related)().name, "Thing");
    assert_eq!(
        desc.column("name").and_then(|c| c.getter),
        Some("get_name")
    );
}
