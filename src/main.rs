fn main() {
    typeref::cli::run();
}
