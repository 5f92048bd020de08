use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;

lazy_static! {
    static ref VIRTUAL_TIMES_NS: Mutex<HashMap<&'static str, u64>> = Mutex::new(HashMap::new());
}

pub fn set_named_value(name: &'static str, value: u64) {
    let mut map = VIRTUAL_TIMES_NS.lock().unwrap();
    map.insert(name, value);
}

pub fn get_named_value(name: &str) -> u64 {
    let map = VIRTUAL_TIMES_NS.lock().unwrap();
    *map.get(name).unwrap()
}

pub fn add_to_named_value(name: &str, amount: u64) -> u64 {
    let mut map = VIRTUAL_TIMES_NS.lock().unwrap();
    let value = map.get_mut(name).unwrap();
    *value += amount;
    *value
}
