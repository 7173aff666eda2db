use clap::Parser;

/// This is a program to build precinct-level election results maps.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the map: the results files, the columns to display,
    /// the shapes file and the display options. Relative paths are resolved from the directory of this file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) A catalog of elections (maps.json). Used with --election to build the map of one
    /// of its entries, or with --list to list them.
    #[clap(long, value_parser)]
    pub catalog: Option<String>,

    /// (name) The name of the election to map from the catalog.
    #[clap(short, long, value_parser)]
    pub election: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the render plan of the map will be written in JSON format
    /// to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the detail table will be written in CSV format to the given location.
    #[clap(short, long, value_parser)]
    pub table: Option<String>,

    /// (file path) A reference render plan in JSON format. If provided, precinctmap will check that the
    /// computed render plan matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (gradient, winnerTakeAll or arrows) Overrides the style mode of the configuration.
    #[clap(long, value_parser)]
    pub style_mode: Option<String>,

    /// If passed as an argument, the absolute counts are displayed instead of the percentages.
    /// This implies the winnerTakeAll style mode.
    #[clap(long, takes_value = false)]
    pub absolute: bool,

    /// (series name, repeatable) Hides a series from the map, the legend totals and the table.
    #[clap(long, value_parser)]
    pub disable: Vec<String>,

    /// If passed as an argument, lists the elections of the catalog and exits.
    #[clap(long, takes_value = false)]
    pub list: bool,

    /// (tag, repeatable) When listing the catalog, only keeps the elections carrying all the given tags.
    #[clap(long, value_parser)]
    pub tag: Vec<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
