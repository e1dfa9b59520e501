//! Catalog-to-request flow without a network.

use thredds_client::{Catalog, NcssQuery, SelectedDataset, SelectionPolicy, ServiceType};
use test_utils::fixtures::catalog::{GOES_CATALOG, RAP_CATALOG};
use wx_common::BoundingBox;

#[test]
fn test_latest_rap_subset_url() {
    let catalog = Catalog::parse(
        "https://thredds-test.unidata.ucar.edu/thredds/catalog/grib/NCEP/RAP/CONUS_13km/catalog.xml",
        RAP_CATALOG,
    )
    .unwrap();
    let dataset = SelectionPolicy::Latest
        .select(&catalog.datasets)
        .cloned()
        .unwrap();
    let selected = SelectedDataset { catalog, dataset };

    let query = NcssQuery::new()
        .variable("Geopotential_height_isobaric")
        .add_lat_lon()
        .vertical_level(50000.0)
        .lon_lat_box(BoundingBox::new(-130.0, 20.0, -79.0, 55.0));
    let url = query.url(&selected.ncss_endpoint().unwrap());

    assert_eq!(url.host_str(), Some("thredds-test.unidata.ucar.edu"));
    assert!(url
        .path()
        .ends_with("/thredds/ncss/grid/grib/NCEP/RAP/CONUS_13km/RR_CONUS_13km_20240305_1400.grib2"));
    assert!(url.query().unwrap().contains("west=230"));
}

#[test]
fn test_latest_goes_file_download_url() {
    let catalog = Catalog::parse(
        "https://thredds.ucar.edu/thredds/catalog/satellite/goes/east/products/CloudAndMoisture/CONUS/Channel02/current/catalog.xml",
        GOES_CATALOG,
    )
    .unwrap();
    let dataset = SelectionPolicy::Latest.select(&catalog.datasets).unwrap();
    assert!(dataset.name.contains("s20240651406170"));

    let url = catalog
        .access_url(dataset, &ServiceType::HttpServer)
        .unwrap();
    assert!(url.as_str().ends_with(".nc"));
    assert!(url.path().starts_with("/thredds/fileServer/satellite/goes/east/"));
}
