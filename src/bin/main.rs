fn main() {
  ipbc::main();
}
