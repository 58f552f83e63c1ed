mod helpers;

use moustache::{Engine, Object, Value};

use crate::helpers::Writer;

#[derive(Debug)]
struct User {
    first: &'static str,
    last: &'static str,
    friends: Vec<&'static str>,
}

impl Object for User {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "first" => Some(Value::from(self.first)),
            "last" => Some(Value::from(self.last)),
            "friends" => Some(Value::from(self.friends.clone())),
            _ => None,
        }
    }

    fn call(&self, name: &str) -> Option<Value> {
        match name {
            "full_name" => Some(Value::from(format!("{} {}", self.first, self.last))),
            _ => None,
        }
    }
}

fn user() -> Value {
    Value::object(User {
        first: "John",
        last: "Smith",
        friends: vec!["Ann", "Bob"],
    })
}

#[test]
fn render_from() {
    let result = Engine::new()
        .compile("lorem {{ ipsum.dolor }}")
        .unwrap()
        .render_from(&Value::from([(
            "ipsum",
            Value::from([("dolor", Value::String(String::from("test")))]),
        )]))
        .to_string()
        .unwrap();
    assert_eq!(result, "lorem test");
}

#[test]
fn render_from_to_writer() {
    let mut w = Writer::new();
    Engine::new()
        .compile("lorem {{ ipsum }}")
        .unwrap()
        .render_from(&Value::from([("ipsum", "test")]))
        .to_writer(&mut w)
        .unwrap();
    assert_eq!(w.into_string(), "lorem test");
}

#[test]
fn render_from_object_fields_and_calls() {
    let data = Value::from([("user", user())]);
    let result = Engine::new()
        .compile("{{user.first}} / {{user.full_name}} / [{{user.nope}}] / {{{user}}}")
        .unwrap()
        .render_from(&data)
        .to_string()
        .unwrap();
    assert_eq!(result, "John / John Smith / [] / ");
}

#[test]
fn render_from_object_section() {
    let data = Value::from([("user", user())]);
    let result = Engine::new()
        .compile("{{#user}}{{last}}:{{#friends}} {{.}}{{/friends}}{{/user}}")
        .unwrap()
        .render_from(&data)
        .to_string()
        .unwrap();
    assert_eq!(result, "Smith: Ann Bob");
}

#[test]
fn render_from_template_ref() {
    let mut engine = Engine::new();
    engine.add_template("greet", "Hi {{user.first}}").unwrap();
    let data = Value::from([("user", user())]);
    let template = engine.get_template("greet").unwrap();
    assert_eq!(template.source(), "Hi {{user.first}}");
    let result = template.render_from(&data).to_string().unwrap();
    assert_eq!(result, "Hi John");
    assert!(engine.get_template("nope").is_none());
}
