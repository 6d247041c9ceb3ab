#![no_main]

use folio_core::redirect::{Route, resolve};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(path) = std::str::from_utf8(data) else {
        return;
    };
    let route = resolve(path);
    match route {
        Route::Page => assert_eq!(route.status(), 200),
        Route::NotFound => assert_eq!(route.status(), 404),
        Route::Redirect { status, location } => {
            assert_eq!(status, 301);
            assert!(location.starts_with("/#"), "redirect to {location}");
            // The target itself serves the page.
            assert_eq!(resolve(location), Route::Page);
        }
    }
});
