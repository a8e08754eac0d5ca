#![allow(dead_code)]

use std::sync::Arc;

use droplet::{Resolvable, Value};

/// A person that may serve a master
#[derive(Debug)]
pub struct Person {
    pub name: String,
    pub incarnations: i64,
    pub master: Option<Arc<Person>>,
}

impl Person {
    pub fn new(name: &str, incarnations: i64, master: Option<Person>) -> Person {
        Person { name: name.to_string(), incarnations, master: master.map(Arc::new) }
    }
}

impl Resolvable for Person {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(self.name.clone().into()),
            "incarnations" => Some(self.incarnations.into()),
            "master" => Some(match &self.master {
                Some(master) => Value::Object(master.clone()),
                None => Value::Nil,
            }),
            _ => None,
        }
    }

    fn to_display_string(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

/// A person with no master field at all
#[derive(Debug)]
pub struct PersonS {
    pub name: String,
    pub incarnations: i64,
}

impl PersonS {
    pub fn new(name: &str, incarnations: i64) -> PersonS {
        PersonS { name: name.to_string(), incarnations }
    }
}

impl Resolvable for PersonS {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(self.name.clone().into()),
            "incarnations" => Some(self.incarnations.into()),
            _ => None,
        }
    }

    fn to_display_string(&self) -> Option<String> {
        Some(self.name.clone())
    }
}
