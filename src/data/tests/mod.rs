mod vmat;
