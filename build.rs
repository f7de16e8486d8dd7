// build.rs

fn main() {
    // Generate build info
    vergen::EmitBuilder::builder()
        .build_timestamp()
        .git_sha(true)
        .emit()
        .expect("Unable to generate build info");
}
