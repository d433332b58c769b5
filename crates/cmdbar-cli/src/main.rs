fn main() {
    cmdbar_cli::run_main();
}
