use std::collections::BTreeMap;

use moustache::{to_value, value, ErrorKind, Value};

#[test]
fn to_value_scalars() {
    assert_eq!(to_value(()).unwrap(), Value::None);
    assert_eq!(to_value(true).unwrap(), Value::Bool(true));
    assert_eq!(to_value(7_u8).unwrap(), Value::Integer(7));
    assert_eq!(to_value(-7_i32).unwrap(), Value::Integer(-7));
    assert_eq!(to_value(u64::MAX).unwrap(), Value::Float(u64::MAX as f64));
    assert_eq!(to_value(0.5_f32).unwrap(), Value::Float(0.5));
    assert_eq!(to_value('x').unwrap(), Value::from("x"));
    assert_eq!(to_value(Some("y")).unwrap(), Value::from("y"));
    assert_eq!(to_value(None::<i32>).unwrap(), Value::None);
}

#[test]
fn to_value_collections() {
    assert_eq!(
        to_value(vec![1, 2]).unwrap(),
        Value::from([Value::from(1), Value::from(2)])
    );
    assert_eq!(
        to_value((1, "a")).unwrap(),
        Value::from([Value::from(1), Value::from("a")])
    );
    let map = BTreeMap::from([(1, "a"), (2, "b")]);
    assert_eq!(to_value(map).unwrap(), Value::from([("1", "a"), ("2", "b")]));
}

#[test]
fn to_value_struct() {
    #[derive(serde::Serialize)]
    struct User {
        name: &'static str,
        age: u32,
        tags: Vec<&'static str>,
    }

    let user = User {
        name: "Ann",
        age: 31,
        tags: vec!["x"],
    };
    assert_eq!(
        to_value(user).unwrap(),
        value! { name: "Ann", age: 31, tags: ["x"] }
    );
}

#[test]
fn to_value_enum() {
    #[derive(serde::Serialize)]
    enum Shape {
        Point,
        Circle(u32),
        Line(u32, u32),
        Rect { w: u32, h: u32 },
    }

    assert_eq!(to_value(Shape::Point).unwrap(), Value::from("Point"));
    assert_eq!(to_value(Shape::Circle(2)).unwrap(), value! { Circle: 2 });
    assert_eq!(to_value(Shape::Line(1, 2)).unwrap(), value! { Line: [1, 2] });
    assert_eq!(
        to_value(Shape::Rect { w: 1, h: 2 }).unwrap(),
        value! { Rect: { w: 1, h: 2 } }
    );
}

#[test]
fn to_value_err_map_key() {
    let map = BTreeMap::from([(true, 1)]);
    let err = to_value(map).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Serialize);
    assert_eq!(err.to_string(), "map key must be a string");
}

#[test]
fn to_value_err_object() {
    #[derive(Debug)]
    struct Opaque;

    impl moustache::Object for Opaque {
        fn field(&self, _: &str) -> Option<Value> {
            None
        }
    }

    let err = to_value(Value::object(Opaque)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Serialize);
}
