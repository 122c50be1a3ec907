fn main() {
    possum::projects::cli::start_cli();
}
