#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate droplet;

use droplet::Context;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = String::from_utf8(data.to_vec()) {
        if let Ok(template) = droplet::parse(&s, None) {
            let _ = template.render(&Context::new());
        }
    }
});
