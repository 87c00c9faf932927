fn main() {
    let now = time::OffsetDateTime::now_utc();
    let stamp_fmt = time::format_description::parse("[year]-[month]-[day] [hour]:[minute] UTC")
        .expect("valid stamp format");

    let stamp = std::env::var("LEVEL2_BUILD_STAMP")
        .unwrap_or_else(|_| now.format(&stamp_fmt).unwrap_or_else(|_| "unknown".to_string()));

    println!("cargo:rerun-if-env-changed=LEVEL2_BUILD_STAMP");
    println!("cargo:rustc-env=LEVEL2_BUILD_STAMP={}", stamp);
}
